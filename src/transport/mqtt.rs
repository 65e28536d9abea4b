//! MQTT session for the command topics.
//!
//! A session owns the client handle and a background thread that drains the
//! connection's event stream. `connect` does not return until the broker has
//! acknowledged the session, so a missing broker is reported at startup
//! instead of on the first publish.

use anyhow::{anyhow, Context, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, Incoming, MqttOptions};
use rumqttc::Transport;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

pub const DEFAULT_BROKER_ADDR: &str = "localhost:1883";
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Destination for outbound command words.
pub trait CommandSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<()>;

    /// Release the broker connection. Later publishes may fail.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Parsed broker address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttEndpoint {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

/// Accepts `host:port`, `[v6]:port`, and an optional
/// `mqtt://`, `tcp://`, `mqtts://` or `ssl://` scheme.
pub fn parse_mqtt_endpoint(addr: &str, tls_override: bool) -> Result<MqttEndpoint> {
    let mut use_tls = tls_override;
    let mut remainder = addr.trim();

    if let Some((scheme, rest)) = remainder.split_once("://") {
        match scheme {
            "mqtt" | "tcp" => {}
            "mqtts" | "ssl" => use_tls = true,
            other => return Err(anyhow!("unsupported MQTT scheme: {}", other)),
        }
        remainder = rest;
    }

    let (host, port) = split_host_port(remainder)?;
    if host.is_empty() {
        return Err(anyhow!("missing MQTT host in {}", addr));
    }
    Ok(MqttEndpoint {
        host,
        port,
        use_tls,
    })
}

fn split_host_port(addr: &str) -> Result<(String, u16)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid MQTT address: {}", addr))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("missing MQTT port in {}", addr))?;
        let port: u16 = port.parse().context("invalid MQTT port")?;
        return Ok((host.to_string(), port));
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("missing MQTT port in {}", addr))?;
    let port: u16 = port.parse().context("invalid MQTT port")?;
    Ok((host.to_string(), port))
}

/// Everything needed to open a session.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub endpoint: MqttEndpoint,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// PEM CA bundle; when absent TLS uses the default roots.
    pub tls_ca_path: Option<PathBuf>,
}

impl SessionOptions {
    pub fn new(endpoint: MqttEndpoint, client_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            client_id: client_id.into(),
            username: None,
            password: None,
            tls_ca_path: None,
        }
    }

    fn transport(&self) -> Result<Transport> {
        if !self.endpoint.use_tls {
            if self.tls_ca_path.is_some() {
                return Err(anyhow!(
                    "MQTT TLS CA provided but TLS is disabled (use mqtts:// or --mqtt-use-tls)"
                ));
            }
            return Ok(Transport::tcp());
        }
        match &self.tls_ca_path {
            Some(path) => {
                let ca = std::fs::read(path)
                    .with_context(|| format!("failed to read MQTT TLS CA {}", path.display()))?;
                Ok(Transport::tls(ca, None, None))
            }
            None => Ok(Transport::tls_with_default_config()),
        }
    }

    fn mqtt_options(&self) -> Result<MqttOptions> {
        let mut options =
            MqttOptions::new(&self.client_id, &self.endpoint.host, self.endpoint.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_start(true);
        if let Some(user) = &self.username {
            options.set_credentials(user, self.password.clone().unwrap_or_default());
        }
        options.set_transport(self.transport()?);
        Ok(options)
    }
}

/// Open a client and wait for the broker's ConnAck.
///
/// Returns the client and the connection positioned just after the ConnAck,
/// so callers may keep iterating it for incoming publishes.
pub fn connect(options: &SessionOptions) -> Result<(Client, Connection)> {
    let (client, mut connection) = Client::new(options.mqtt_options()?, 10);
    loop {
        let event = connection.iter().next();
        match event {
            Some(Ok(Event::Incoming(Incoming::ConnAck(_)))) => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "failed to connect to MQTT broker {}:{}",
                    options.endpoint.host, options.endpoint.port
                )));
            }
            None => return Err(anyhow!("MQTT event loop closed before ConnAck")),
        }
    }
    log::info!(
        "Connected to MQTT broker {}:{} (TLS: {}, auth: {})",
        options.endpoint.host,
        options.endpoint.port,
        options.endpoint.use_tls,
        options.username.is_some()
    );
    Ok((client, connection))
}

/// Publishing session with a background delivery thread.
///
/// Dropping the session disconnects and joins the thread.
pub struct MqttSession {
    client: Client,
    connection_handle: Option<JoinHandle<()>>,
}

impl MqttSession {
    pub fn connect(options: &SessionOptions) -> Result<Self> {
        let (client, mut connection) = connect(options)?;
        let handle = std::thread::spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(Event::Incoming(_)) | Ok(Event::Outgoing(_)) => {}
                    Err(e) => {
                        log::debug!("MQTT connection closed: {}", e);
                        break;
                    }
                }
            }
        });
        Ok(Self {
            client,
            connection_handle: Some(handle),
        })
    }

    pub fn disconnect(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.connection_handle.take() else {
            return Ok(());
        };
        let result = self.client.disconnect().context("MQTT disconnect");
        let _ = handle.join();
        result
    }
}

impl CommandSink for MqttSession {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .with_context(|| format!("publish to {}", topic))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.shutdown()
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("MQTT session teardown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_scheme_endpoints() {
        let endpoint = parse_mqtt_endpoint(DEFAULT_BROKER_ADDR, false).expect("endpoint");
        assert_eq!(
            endpoint,
            MqttEndpoint {
                host: "localhost".to_string(),
                port: 1883,
                use_tls: false,
            }
        );

        let endpoint = parse_mqtt_endpoint("mqtts://broker.lan:8883", false).expect("endpoint");
        assert!(endpoint.use_tls);
        assert_eq!(endpoint.host, "broker.lan");
        assert_eq!(endpoint.port, 8883);

        let endpoint = parse_mqtt_endpoint("tcp://10.0.0.2:1883", true).expect("endpoint");
        assert!(endpoint.use_tls);
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let endpoint = parse_mqtt_endpoint("[::1]:1883", false).expect("endpoint");
        assert_eq!(endpoint.host, "::1");
        assert_eq!(endpoint.port, 1883);
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(parse_mqtt_endpoint("ws://localhost:1883", false).is_err());
        assert!(parse_mqtt_endpoint("localhost", false).is_err());
        assert!(parse_mqtt_endpoint("localhost:notaport", false).is_err());
        assert!(parse_mqtt_endpoint(":1883", false).is_err());
    }

    #[test]
    fn ca_without_tls_is_rejected() {
        let endpoint = parse_mqtt_endpoint("localhost:1883", false).expect("endpoint");
        let mut options = SessionOptions::new(endpoint, "test");
        options.tls_ca_path = Some(PathBuf::from("/nonexistent/ca.pem"));
        assert!(options.transport().is_err());
    }
}
