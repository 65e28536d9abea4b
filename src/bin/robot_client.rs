//! robot_client - robot-side consumer of the teleop command topics.
//!
//! This process:
//! 1. Subscribes to robot/automatic_command and robot/manual_command
//! 2. Keeps the latest word from each topic
//! 3. Every tick, lets a manual command younger than the hold window win,
//!    otherwise follows the automatic stream
//! 4. Logs the selected command and the motor driver levels it maps to
//!
//! Motor pins are not driven; levels are only logged.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rumqttc::v5::{mqttbytes::QoS, Event, Incoming};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_teleop::transport::mqtt::{self, parse_mqtt_endpoint, SessionOptions};
use color_teleop::{CommandArbiter, MotorOutputs, AUTOMATIC_TOPIC, MANUAL_TOPIC};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Consume teleop commands from MQTT and select the active drive command"
)]
struct Args {
    /// MQTT broker address.
    #[arg(long, env = "MQTT_BROKER_ADDR", default_value = mqtt::DEFAULT_BROKER_ADDR)]
    mqtt_broker_addr: String,

    /// MQTT client identifier.
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "robot_client")]
    mqtt_client_id: String,

    /// MQTT username for authentication.
    #[arg(long, env = "MQTT_USERNAME")]
    mqtt_username: Option<String>,

    /// MQTT password for authentication.
    #[arg(long, env = "MQTT_PASSWORD")]
    mqtt_password: Option<String>,

    /// Enable TLS for MQTT (implied by mqtts:// addresses).
    #[arg(long, env = "MQTT_USE_TLS")]
    mqtt_use_tls: bool,

    /// How long a manual command overrides automatic ones, in milliseconds.
    #[arg(long, env = "MANUAL_HOLD_MS", default_value_t = 1000)]
    manual_hold_ms: u64,

    /// Command evaluation period in milliseconds.
    #[arg(long, env = "TICK_MS", default_value_t = 100)]
    tick_ms: u64,
}

enum Inbound {
    Command { topic: String, payload: String },
    Closed(String),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.tick_ms == 0 {
        return Err(anyhow!("--tick-ms must be greater than zero"));
    }
    let endpoint = parse_mqtt_endpoint(&args.mqtt_broker_addr, args.mqtt_use_tls)?;
    let mut options = SessionOptions::new(endpoint, &args.mqtt_client_id);
    options.username = args.mqtt_username.clone();
    options.password = args.mqtt_password.clone();

    let (client, mut connection) =
        mqtt::connect(&options).context("Failed to connect to MQTT broker")?;
    client.subscribe(AUTOMATIC_TOPIC, QoS::AtMostOnce)?;
    client.subscribe(MANUAL_TOPIC, QoS::AtMostOnce)?;
    log::info!("Subscribed to {} and {}", AUTOMATIC_TOPIC, MANUAL_TOPIC);

    let (tx, rx) = mpsc::channel();
    let reader = std::thread::spawn(move || {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    let topic = match std::str::from_utf8(&publish.topic) {
                        Ok(topic) => topic.to_string(),
                        Err(e) => {
                            log::warn!("Skipping publish with invalid topic: {}", e);
                            continue;
                        }
                    };
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    if tx.send(Inbound::Command { topic, payload }).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let _ = tx.send(Inbound::Closed(e.to_string()));
                    break;
                }
            }
        }
    });

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("install Ctrl-C handler")?;
    }

    let tick = Duration::from_millis(args.tick_ms);
    let mut arbiter = CommandArbiter::new(Duration::from_millis(args.manual_hold_ms));
    let mut active: Option<String> = None;
    let mut failure = None;

    'ticks: while !stop.load(Ordering::SeqCst) {
        let deadline = Instant::now() + tick;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Inbound::Command { topic, payload }) => {
                    log::info!("Received message on topic '{}': {}", topic, payload);
                    arbiter.record(&topic, &payload, Instant::now());
                }
                Ok(Inbound::Closed(reason)) => {
                    failure = Some(anyhow!("MQTT connection lost: {}", reason));
                    break 'ticks;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    failure = Some(anyhow!("MQTT reader stopped"));
                    break 'ticks;
                }
            }
        }

        let Some(command) = arbiter.current(Instant::now()) else {
            continue;
        };
        let outputs = MotorOutputs::for_command(command);
        if active.as_deref() == Some(command) {
            log::debug!("Processing command: {} ({:?})", command, outputs);
            continue;
        }
        match outputs {
            Some(outputs) => log::info!("Processing command: {} -> {:?}", command, outputs),
            None => log::info!("Processing command: {} (unknown, motors unchanged)", command),
        }
        active = Some(command.to_string());
    }

    if let Err(e) = client.disconnect() {
        log::debug!("MQTT disconnect: {}", e);
    }
    let _ = reader.join();
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
