use crate::error::Result;
use crate::field_descriptor::{describe, TemplateFilter};
use crate::flatten::flatten;
use crate::home_assistant_config::SensorConfig;
use crate::mqtt_wrapper::{MqttWrapper, QoS};
use crate::nested_value::NestedValue;
use crate::units::UnitTable;

use log::{debug, error};

pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// Discovery configs round numeric readings to two decimals.
const VALUE_FILTER: TemplateFilter = TemplateFilter::Round(2);

/// A discovery config together with the topic it has to be published on.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub config: SensorConfig,
}

impl DiscoveryMessage {
    pub fn payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.config)
    }

    pub fn pretty_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.config)
    }
}

/// The device a state topic belongs to is named after its last level.
pub fn device_id(state_topic: &str) -> &str {
    state_topic.rsplit('/').next().unwrap_or(state_topic)
}

/// Builds one sensor discovery config for every leaf of `root`.
pub fn build_discovery_messages(
    state_topic: &str,
    root: &NestedValue,
    units: &UnitTable,
    discovery_prefix: &str,
) -> Result<Vec<DiscoveryMessage>> {
    let device_id = device_id(state_topic);
    flatten(root)
        .into_iter()
        .map(|leaf| -> Result<DiscoveryMessage> {
            let unit = units.infer_unit(&leaf.path);
            let descriptor = describe(&leaf.path)?.with_filter(VALUE_FILTER);
            let config = SensorConfig::new(state_topic, device_id, descriptor, unit);
            let topic = format!(
                "{}/sensor/{}/{}/config",
                discovery_prefix, device_id, config.object_id
            );
            Ok(DiscoveryMessage { topic, config })
        })
        .collect()
}

pub struct HomeAssistant<'a, MQTT: MqttWrapper> {
    client: &'a mut MQTT,
}

impl<'a, MQTT: MqttWrapper> HomeAssistant<'a, MQTT> {
    pub fn new(client: &'a mut MQTT) -> Self {
        Self { client }
    }

    fn publish_json(&mut self, topic: &str, payload: String) -> bool {
        debug!("Publishing to {topic} with payload {payload}");

        if let Err(e) = self.client.publish(topic, QoS::AtMostOnce, true, payload) {
            error!("Failed to publish message to {topic}: {e:?}");
            return false;
        }
        true
    }

    /// Publishes every config retained, so Home Assistant picks the sensors
    /// up again after a restart. Returns how many were handed to the client.
    pub fn publish_configs(&mut self, messages: &[DiscoveryMessage]) -> usize {
        let mut published = 0;
        for message in messages {
            let payload = match message.payload() {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to serialize config for {}: {e}", message.topic);
                    continue;
                }
            };
            if self.publish_json(&message.topic, payload) {
                published += 1;
            }
        }
        published
    }
}
