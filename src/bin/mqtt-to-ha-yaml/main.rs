use anyhow::anyhow;
use clap::Parser;
use log::info;
use mqtt2ha::{ha_yaml, mqtt_wrapper::MqttWrapper, receiver::receive_json};
use mqtt2ha_tools::{
    config::{self, BrokerArgs, Config},
    logging,
    rumqttc_wrapper::RumqttcWrapper,
};

/// Waits for one JSON message on an MQTT topic and prints a Home Assistant
/// `mqtt: sensor:` YAML configuration with one sensor per value.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    broker: BrokerArgs,

    /// MQTT topic to subscribe to
    #[arg(long)]
    topic: String,

    /// Give up after this many seconds without a JSON message
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logger(args.verbose);
    info!("Running revision: {}", env!("GIT_HASH"));

    let config = Config::load(&args.broker.config);
    let mqtt_config = args.broker.apply(config.mqtt, "mqtt_to_yaml");

    let mut client = RumqttcWrapper::new(&mqtt_config)?;
    let received = receive_json(&mut client, &args.topic, config::timeout(args.timeout));
    client.disconnect()?;
    let message = received?.ok_or_else(|| anyhow!("no JSON message received on {}", args.topic))?;

    let yaml = ha_yaml::generate(&message.topic, &message.root)?;
    println!("{yaml}");
    Ok(())
}
