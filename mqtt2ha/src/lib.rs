// externally visible interfaces
pub mod error;
pub mod field_descriptor;
pub mod flatten;
pub mod ha_yaml;
pub mod home_assistant;
pub mod home_assistant_config;
pub mod mqtt_config;
pub mod mqtt_wrapper;
pub mod nested_value;
pub mod receiver;
pub mod simple_mqtt;
pub mod sma;
pub mod units;

pub use error::{Error, Result};
pub use field_descriptor::{describe, FieldDescriptor, TemplateFilter, ValueTemplate};
pub use flatten::{flatten, KeyPath, LeafRecord};
pub use nested_value::NestedValue;
pub use units::UnitTable;
