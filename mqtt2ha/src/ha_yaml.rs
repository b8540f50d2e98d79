//! Static `mqtt:` sensor configuration for Home Assistant's `configuration.yaml`.

use serde::Serialize;

use crate::error::Result;
use crate::field_descriptor::describe;
use crate::flatten::flatten;
use crate::home_assistant_config::YamlSensorConfig;
use crate::nested_value::NestedValue;

#[derive(Serialize)]
struct YamlDocument {
    mqtt: MqttSection,
}

#[derive(Serialize)]
struct MqttSection {
    sensor: Vec<YamlSensorConfig>,
}

pub fn build_sensors(state_topic: &str, root: &NestedValue) -> Result<Vec<YamlSensorConfig>> {
    flatten(root)
        .iter()
        .map(|leaf| -> Result<YamlSensorConfig> {
            Ok(YamlSensorConfig::new(state_topic, describe(&leaf.path)?))
        })
        .collect()
}

/// Renders one MQTT sensor per leaf of `root`, all reading from `state_topic`.
pub fn generate(state_topic: &str, root: &NestedValue) -> Result<String> {
    let document = YamlDocument {
        mqtt: MqttSection {
            sensor: build_sensors(state_topic, root)?,
        },
    };
    Ok(serde_yaml::to_string(&document)?)
}
