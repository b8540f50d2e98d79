pub mod config;
pub mod logging;
pub mod rumqttc_wrapper;
