//! color_teleop - camera color tracking + manual teleoperation over MQTT.
//!
//! This process:
//! 1. Connects to the MQTT broker (fatal on failure)
//! 2. Opens the camera (fatal on failure, after closing the broker session)
//! 3. Publishes `move_forward` / `stop` on robot/automatic_command every frame
//! 4. Forwards w/a/s/d/space key presses on robot/manual_command
//! 5. Exits on `q`, Ctrl-C, or the first failed frame read

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use color_teleop::command::KEY_HELP;
use color_teleop::console::{Console, TerminalConsole};
use color_teleop::control::{self, ExitReason};
use color_teleop::ingest::camera::device_path;
use color_teleop::{ColorObjectDetector, Detector, MqttSession, SessionOptions, TeleopConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Track colored objects on camera and drive a robot over MQTT"
)]
struct Args {
    /// JSON config file (broker, camera, detector sections).
    #[arg(long, env = "TELEOP_CONFIG")]
    config: Option<PathBuf>,

    /// MQTT broker address (overrides config).
    #[arg(long)]
    broker: Option<String>,

    /// Camera index, device path, or stub://<name> (overrides config).
    #[arg(long)]
    camera: Option<String>,

    /// Also treat hues 170..=180 as red.
    #[arg(long)]
    red_wraparound: bool,

    /// Show an on-screen preview window (requires the preview-window feature).
    #[arg(long)]
    window: bool,
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
    let mut cfg = TeleopConfig::load_from(args.config.as_deref())?;
    if let Some(broker) = args.broker {
        cfg.broker.addr = broker;
    }
    if let Some(camera) = args.camera {
        cfg.camera.device = device_path(&camera);
    }
    cfg.red_wraparound |= args.red_wraparound;

    let mut session_options = SessionOptions::new(cfg.broker_endpoint()?, &cfg.broker.client_id);
    session_options.username = cfg.broker.username.clone();
    session_options.password = cfg.broker.password.clone();
    session_options.tls_ca_path = cfg.broker.tls_ca_path.clone();

    let mut session =
        MqttSession::connect(&session_options).context("Error connecting to MQTT broker")?;

    let mut camera = control::open_camera(cfg.camera.clone(), &mut session)?;

    let detector = ColorObjectDetector::new(cfg.palette());
    let mut console = build_console(args.window)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("install Ctrl-C handler")?;
    }

    log::info!(
        "color_teleop running: camera={} broker={} detector={} red_wraparound={}",
        cfg.camera.device,
        cfg.broker.addr,
        detector.name(),
        cfg.red_wraparound
    );
    println!("{}", KEY_HELP);

    let outcome = control::run(
        &mut camera,
        &detector,
        console.as_mut(),
        &mut session,
        &stop,
    );

    drop(camera);
    drop(console);

    let summary = outcome?;
    session.disconnect()?;
    if summary.exit == ExitReason::Quit {
        log::info!(
            "Stopped after {} frames ({} detections, {} manual commands)",
            summary.frames,
            summary.detections,
            summary.manual_commands
        );
    }
    Ok(())
}

fn build_console(window: bool) -> Result<Box<dyn Console>> {
    if !window {
        return Ok(Box::new(TerminalConsole::new()));
    }
    #[cfg(feature = "preview-window")]
    {
        Ok(Box::new(color_teleop::console::PreviewWindow::new()))
    }
    #[cfg(not(feature = "preview-window"))]
    {
        Err(anyhow::anyhow!(
            "--window requires the preview-window feature (rebuild with --features preview-window)"
        ))
    }
}
