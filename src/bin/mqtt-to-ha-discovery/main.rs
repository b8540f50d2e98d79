use anyhow::anyhow;
use clap::Parser;
use log::{debug, info, warn};
use mqtt2ha::{
    flatten,
    home_assistant::{build_discovery_messages, HomeAssistant},
    mqtt_wrapper::MqttWrapper,
    receiver::receive_json,
};
use mqtt2ha_tools::{
    config::{self, BrokerArgs, Config},
    logging,
    rumqttc_wrapper::RumqttcWrapper,
};

/// Waits for one JSON message on an MQTT topic and publishes a Home Assistant
/// MQTT discovery config for every value in it.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    broker: BrokerArgs,

    /// MQTT topic to subscribe to
    #[arg(long)]
    topic: String,

    /// Print discovery configs instead of publishing
    #[arg(long)]
    debug: bool,

    /// Discovery topic prefix [default: homeassistant]
    #[arg(long)]
    discovery_prefix: Option<String>,

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

    let mut config = Config::load(&args.broker.config);
    if args.discovery_prefix.is_some() {
        config.discovery_prefix = args.discovery_prefix.clone();
    }
    let units = config.unit_table();
    let mqtt_config = args.broker.apply(config.mqtt.clone(), "mqtt_to_discovery");

    let mut client = RumqttcWrapper::new(&mqtt_config)?;
    let message = match receive_json(&mut client, &args.topic, config::timeout(args.timeout)) {
        Ok(Some(message)) => message,
        Ok(None) => {
            client.disconnect()?;
            return Err(anyhow!("no JSON message received on {}", args.topic));
        }
        Err(e) => {
            client.disconnect()?;
            return Err(e);
        }
    };
    debug!(
        "Full payload: {}",
        serde_json::to_string_pretty(&message.root.to_json())?
    );

    let leaves: Vec<_> = flatten(&message.root)
        .into_iter()
        .map(|leaf| leaf.path.to_string())
        .collect();
    debug!("Flattened keys: {}", leaves.join(" "));

    let messages = build_discovery_messages(
        &message.topic,
        &message.root,
        &units,
        config.discovery_prefix(),
    )?;
    if messages.is_empty() {
        warn!("Payload on {} has no values, nothing to announce", message.topic);
    }

    if args.debug {
        for discovery in &messages {
            println!("Discovery topic: {}", discovery.topic);
            println!("{}", discovery.pretty_payload()?);
        }
    } else {
        let published = HomeAssistant::new(&mut client).publish_configs(&messages);
        info!(
            "Published {published} of {} discovery configs",
            messages.len()
        );
    }

    client.disconnect()?;
    info!("Discovery config generation complete");
    Ok(())
}
