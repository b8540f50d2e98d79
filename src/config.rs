use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Args;
use log::{info, warn};
use mqtt2ha::{home_assistant::DEFAULT_DISCOVERY_PREFIX, mqtt_config::MqttConfig, UnitTable};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub discovery_prefix: Option<String>,
    /// Extra unit of measurement per top-level key, on top of the built-in ones.
    pub units: HashMap<String, String>,
}

impl Config {
    /// Reads the TOML file if present, then applies environment overrides.
    /// A missing or broken file only produces a warning.
    pub fn load(path: &Path) -> Config {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => {
                info!("loading configuration from {}", path.display());
                contents
            }
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                "".into()
            }
        };
        let mut config = match toml::from_str::<Config>(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("toml config unparsable: {e}");
                Config::default()
            }
        };
        config.apply_overrides(|name| env::var(name).ok());
        config
    }

    /// Overrides broker settings from `$MQTT_BROKER_HOST`, `$MQTT_PORT`,
    /// `$MQTT_USERNAME` and `$MQTT_PASSWORD`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("MQTT_BROKER_HOST") {
            self.mqtt.host = host;
        }
        if let Some(port) = var("MQTT_PORT") {
            match port.parse() {
                Ok(port) => self.mqtt.port = Some(port),
                Err(e) => warn!("ignoring invalid MQTT_PORT {port}: {e}"),
            }
        }
        if let Some(username) = var("MQTT_USERNAME") {
            self.mqtt.username = Some(username);
        }
        if let Some(password) = var("MQTT_PASSWORD") {
            self.mqtt.password = Some(password);
        }
    }

    pub fn discovery_prefix(&self) -> &str {
        self.discovery_prefix
            .as_deref()
            .unwrap_or(DEFAULT_DISCOVERY_PREFIX)
    }

    pub fn unit_table(&self) -> UnitTable {
        UnitTable::default().with_overrides(self.units.clone())
    }
}

/// Broker flags shared by the tools. Each one overrides the value from the
/// config file and the environment.
#[derive(Args, Clone, Debug, Default)]
pub struct BrokerArgs {
    /// MQTT broker address [default: localhost]
    #[arg(long)]
    pub broker: Option<String>,

    /// MQTT broker port [default: 1883, 8883 with TLS]
    #[arg(long)]
    pub port: Option<u16>,

    /// MQTT client ID
    #[arg(long)]
    pub client_id: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Connect to the broker over TLS
    #[arg(long)]
    pub tls: bool,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl BrokerArgs {
    pub fn apply(&self, mut mqtt: MqttConfig, default_client_id: &str) -> MqttConfig {
        if let Some(broker) = &self.broker {
            mqtt.host = broker.clone();
        }
        if self.port.is_some() {
            mqtt.port = self.port;
        }
        if let Some(username) = &self.username {
            mqtt.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            mqtt.password = Some(password.clone());
        }
        if self.tls {
            mqtt.tls = Some(true);
        }
        mqtt.client_id = self
            .client_id
            .clone()
            .or(mqtt.client_id)
            .or_else(|| Some(default_client_id.to_string()));
        mqtt
    }
}

pub fn timeout(seconds: Option<u64>) -> Option<Duration> {
    seconds.map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml() {
        let config: Config = toml::from_str(
            r#"
            discovery_prefix = "ha"

            [mqtt]
            host = "broker.local"
            port = 1884
            username = "relay"

            [units]
            Temperature = "°C"
            Power = "W"
            "#,
        )
        .unwrap();
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port(), 1884);
        assert_eq!(config.discovery_prefix(), "ha");

        let units = config.unit_table();
        let temperature = ["Temperature"].into_iter().collect();
        assert_eq!(units.infer_unit(&temperature), Some("°C"));
        let yield_path = ["Daily Yield"].into_iter().collect();
        assert_eq!(units.infer_unit(&yield_path), Some("Wh"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.discovery_prefix(), "homeassistant");
        assert_eq!(config.unit_table(), UnitTable::default());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.discovery_prefix(), "homeassistant");
    }

    #[test]
    fn environment_overrides_file() {
        let mut config: Config = toml::from_str("[mqtt]\nhost = \"file\"").unwrap();
        config.apply_overrides(|name| match name {
            "MQTT_BROKER_HOST" => Some("env".to_string()),
            "MQTT_PORT" => Some("not a port".to_string()),
            "MQTT_USERNAME" => Some("user".to_string()),
            _ => None,
        });
        assert_eq!(config.mqtt.host, "env");
        assert_eq!(config.mqtt.port, None);
        assert_eq!(config.mqtt.username.as_deref(), Some("user"));
        assert_eq!(config.mqtt.password, None);
    }

    #[test]
    fn flags_override_everything() {
        let mqtt = MqttConfig {
            host: "env".to_string(),
            client_id: Some("from_file".to_string()),
            ..Default::default()
        };
        let args = BrokerArgs {
            broker: Some("flag".to_string()),
            port: Some(1999),
            ..Default::default()
        };
        let mqtt = args.apply(mqtt, "mqtt_to_yaml");
        assert_eq!(mqtt.host, "flag");
        assert_eq!(mqtt.port(), 1999);
        assert_eq!(mqtt.client_id.as_deref(), Some("from_file"));

        let mqtt = BrokerArgs::default().apply(MqttConfig::default(), "mqtt_to_yaml");
        assert_eq!(mqtt.client_id.as_deref(), Some("mqtt_to_yaml"));
    }
}
