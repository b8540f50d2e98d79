use std::time::Duration;

use crate::mqtt_config::MqttConfig;

#[derive(Clone, Copy, Debug)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// A publish received from the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub trait MqttWrapper {
    // This trait provides an interface that decouples library code from an
    // implementation of the MQTT client. On library calling code, one needs to
    // wrap the MQTT implementation, i.e. the client, in a new type that in
    // turn implements this trait.

    fn subscribe(&mut self, topic: &str, qos: QoS) -> anyhow::Result<()>;

    fn publish<S, V>(&mut self, topic: S, qos: QoS, retain: bool, payload: V) -> anyhow::Result<()>
    where
        S: Clone + Into<String>,
        V: Clone + Into<Vec<u8>>;

    /// Blocks until the next incoming publish. Returns `None` when `timeout`
    /// elapses first; `None` as timeout waits forever.
    fn recv(&mut self, timeout: Option<Duration>) -> anyhow::Result<Option<IncomingMessage>>;

    /// Flushes everything queued for sending and closes the connection.
    fn disconnect(&mut self) -> anyhow::Result<()>;

    fn new(config: &MqttConfig) -> anyhow::Result<Self>
    where
        Self: Sized;
}
