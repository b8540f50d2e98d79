use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use mqtt2ha::{
    mqtt_wrapper::MqttWrapper,
    simple_mqtt::SimpleMqtt,
    sma::{extract_readings, InverterReading, SmaClient},
};
use mqtt2ha_tools::{config::Config, logging, rumqttc_wrapper::RumqttcWrapper};
use std::path::PathBuf;

/// Data collector for SMA Sunny Boy inverters: reads the DC tracker and yield
/// measurements from the inverter web UI and publishes them to MQTT.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The IP of the inverter to collect data from
    #[arg(long = "inv-ip", alias = "InvIP")]
    inverter_ip: String,

    /// The password for the user account on the inverter
    #[arg(long = "inv-pass", alias = "InvPass", env = "SMA_PASSWORD", hide_env_values = true)]
    inverter_password: String,

    /// The IP of the MQTT server to publish messages to
    #[arg(long = "mqtt-ip", alias = "MQTTIP")]
    mqtt_ip: Option<String>,

    /// MQTT server port [default: 1883]
    #[arg(long = "mqtt-port")]
    mqtt_port: Option<u16>,

    /// The MQTT topic (root) to publish messages to. /<inverter-serial> will be added
    #[arg(long = "mqtt-topic", alias = "MQTTTopic")]
    mqtt_topic: String,

    /// Configuration file
    #[arg(long, default_value = mqtt2ha_tools::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

fn publish_readings(config: &Config, args: &Args, readings: &[InverterReading]) -> anyhow::Result<()> {
    let mut mqtt_config = config.mqtt.clone();
    if let Some(ip) = &args.mqtt_ip {
        mqtt_config.host = ip.clone();
    }
    if args.mqtt_port.is_some() {
        mqtt_config.port = args.mqtt_port;
    }
    mqtt_config.client_id.get_or_insert_with(|| "inverter".to_string());

    let mut client = RumqttcWrapper::new(&mqtt_config)?;
    let mut publisher = SimpleMqtt::new(&mut client, &args.mqtt_topic);
    for reading in readings {
        publisher.publish(reading);
    }
    client.disconnect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logger(args.verbose);
    info!("Running revision: {}", env!("GIT_HASH"));

    let config = Config::load(&args.config);

    let mut inverter = SmaClient::new(&format!("https://{}", args.inverter_ip))?;
    inverter
        .login(&args.inverter_password)
        .context("login request failed")?;

    // log out even when fetching or publishing failed
    let published = inverter
        .get_all_online_values()
        .context("getAllOnlValues request failed")
        .and_then(|values| {
            let readings = extract_readings(&values);
            if readings.is_empty() {
                warn!("inverter reported no devices");
                return Ok(());
            }
            publish_readings(&config, &args, &readings)
        });

    inverter.logout().context("logout request failed")?;
    published
}
