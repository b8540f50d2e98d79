use serde::Serialize;

use crate::field_descriptor::FieldDescriptor;

/// `DeviceConfig` is used to define the configuration for a Home Assistant device
/// in the MQTT discovery protocol and is used to group entities together.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceConfig {
    identifiers: Vec<String>,
    name: String,
}

impl DeviceConfig {
    pub fn new(device_id: &str) -> Self {
        Self {
            identifiers: vec![device_id.to_string()],
            name: device_id.to_string(),
        }
    }
}

/// `SensorConfig` is used to define the configuration for a Home Assistant sensor entity
/// in the MQTT discovery protocol.
///
/// More information about the MQTT discovery protocol can be found here:
/// https://www.home-assistant.io/integrations/mqtt/#mqtt-discovery
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorConfig {
    pub name: String,           // The name of the sensor.
    pub state_topic: String,    // The MQTT topic where sensor readings will be published.
    pub value_template: String, // A template to extract a value from the mqtt message.
    pub unique_id: String,      // A globally unique identifier for the sensor.
    pub object_id: String,      // Used to generate the entity id.
    pub device: DeviceConfig, // The device that the sensor belongs to, used to group entities together.
    // exclude optional if they are not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
}

impl SensorConfig {
    pub fn new(
        state_topic: &str,
        device_id: &str,
        descriptor: FieldDescriptor,
        unit_of_measurement: Option<&str>,
    ) -> Self {
        Self {
            name: descriptor.display_name,
            state_topic: state_topic.to_string(),
            value_template: descriptor.value_template.to_string(),
            unique_id: format!("{}_{}", device_id, descriptor.object_id),
            object_id: descriptor.object_id,
            device: DeviceConfig::new(device_id),
            unit_of_measurement: unit_of_measurement.map(str::to_string),
        }
    }
}

/// One entry of the `mqtt: sensor:` list in Home Assistant's YAML configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YamlSensorConfig {
    pub name: String,
    pub state_topic: String,
    pub value_template: String,
}

impl YamlSensorConfig {
    pub fn new(state_topic: &str, descriptor: FieldDescriptor) -> Self {
        Self {
            name: descriptor.display_name,
            state_topic: state_topic.to_string(),
            value_template: descriptor.value_template.to_string(),
        }
    }
}
