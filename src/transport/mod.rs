//! Broker transport for robot command topics.

pub mod mqtt;

pub use mqtt::{
    parse_mqtt_endpoint, CommandSink, MqttEndpoint, MqttSession, SessionOptions,
    DEFAULT_BROKER_ADDR,
};
