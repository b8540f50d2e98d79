use crate::{
    mqtt_wrapper::{MqttWrapper, QoS},
    sma::InverterReading,
};

use log::{debug, info, warn};

/// Publishes each inverter's readings as one JSON document to
/// `<topic_root>/<serial>`.
pub struct SimpleMqtt<'a, MQTT: MqttWrapper> {
    client: &'a mut MQTT,
    topic_root: String,
}

impl<'a, MQTT: MqttWrapper> SimpleMqtt<'a, MQTT> {
    pub fn new(client: &'a mut MQTT, topic_root: &str) -> Self {
        Self {
            client,
            topic_root: topic_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn topic(&self, reading: &InverterReading) -> String {
        format!("{}/{}", self.topic_root, reading.serial)
    }

    pub fn publish(&mut self, reading: &InverterReading) -> bool {
        let topic = self.topic(reading);
        let payload = reading.to_json();
        debug!("Publishing to {topic} with payload {payload}");

        if let Err(e) = self.client.publish(topic.clone(), QoS::AtMostOnce, false, payload) {
            warn!("mqtt error for inverter {}: {e:?}", reading.serial);
            return false;
        }
        info!("Published readings of inverter {} to {topic}", reading.serial);
        true
    }
}
