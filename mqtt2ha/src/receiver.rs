use std::time::{Duration, Instant};

use anyhow::Context;
use log::{debug, info, warn};

use crate::mqtt_wrapper::{MqttWrapper, QoS};
use crate::nested_value::NestedValue;

/// The first usable message seen on a subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedJson {
    /// Topic the message was actually published on, which differs from the
    /// subscription when it contains wildcards.
    pub topic: String,
    pub root: NestedValue,
}

/// Subscribes to `topic` and waits for one message carrying a JSON object.
///
/// Payloads that are not JSON objects are logged and skipped. Returns `None`
/// when `timeout` elapses before a usable message arrives.
pub fn receive_json<MQTT: MqttWrapper>(
    client: &mut MQTT,
    topic: &str,
    timeout: Option<Duration>,
) -> anyhow::Result<Option<ReceivedJson>> {
    client
        .subscribe(topic, QoS::AtMostOnce)
        .with_context(|| format!("subscription to {topic} failed"))?;
    info!("Subscribed to topic: {topic}");

    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    loop {
        let remaining = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) => Some(remaining),
                None => return Ok(None),
            },
            None => None,
        };
        let Some(message) = client.recv(remaining)? else {
            return Ok(None);
        };

        if !topic_matches(topic, &message.topic) {
            debug!("Ignoring message on {}", message.topic);
            continue;
        }
        match NestedValue::from_payload(&message.payload) {
            Ok(root) => {
                debug!("Received JSON on {}", message.topic);
                return Ok(Some(ReceivedJson {
                    topic: message.topic,
                    root,
                }));
            }
            Err(e) => warn!("Skipping payload on {}: {e}", message.topic),
        }
    }
}

/// MQTT topic filter matching with `+` and `#` wildcards.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(expected), Some(level)) if expected == level => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
