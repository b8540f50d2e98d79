use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context};
use log::{debug, info, warn};
use mqtt2ha::{
    mqtt_config::MqttConfig,
    mqtt_wrapper::{self, IncomingMessage},
};
use rumqttc::{
    tokio_rustls::rustls::{ClientConfig, RootCertStore},
    Client, ConnectionError, Event, MqttOptions, Outgoing, Packet, Transport,
};

const DEFAULT_CLIENT_ID: &str = "mqtt2ha";

type Notification = Result<IncomingMessage, ConnectionError>;

pub struct RumqttcWrapper {
    client: Client,
    incoming: Receiver<Notification>,
    event_loop: Option<JoinHandle<()>>,
}

fn match_qos(qos: mqtt_wrapper::QoS) -> rumqttc::QoS {
    match qos {
        mqtt_wrapper::QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        mqtt_wrapper::QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        mqtt_wrapper::QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

fn tls_transport() -> anyhow::Result<Transport> {
    // Use rustls-native-certs to load root certificates from the operating system.
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for e in native.errors {
        warn!("could not load platform certificate: {e}");
    }
    for cert in native.certs {
        roots.add(cert).context("invalid platform certificate")?;
    }

    let client_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Transport::tls_with_config(client_config.into()))
}

impl mqtt_wrapper::MqttWrapper for RumqttcWrapper {
    fn subscribe(&mut self, topic: &str, qos: mqtt_wrapper::QoS) -> anyhow::Result<()> {
        Ok(self.client.subscribe(topic, match_qos(qos))?)
    }

    fn publish<S, V>(
        &mut self,
        topic: S,
        qos: mqtt_wrapper::QoS,
        retain: bool,
        payload: V,
    ) -> anyhow::Result<()>
    where
        S: Clone + Into<String>,
        V: Clone + Into<Vec<u8>>,
    {
        Ok(self.client.publish(topic, match_qos(qos), retain, payload)?)
    }

    fn recv(&mut self, timeout: Option<Duration>) -> anyhow::Result<Option<IncomingMessage>> {
        let notification = match timeout {
            Some(timeout) => match self.incoming.recv_timeout(timeout) {
                Ok(notification) => notification,
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!("MQTT event loop has stopped"))
                }
            },
            None => self
                .incoming
                .recv()
                .map_err(|_| anyhow!("MQTT event loop has stopped"))?,
        };
        Ok(Some(notification.context("MQTT connection failed")?))
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        // the disconnect request is queued behind all pending publishes
        if let Err(e) = self.client.disconnect() {
            debug!("disconnect request not delivered: {e}");
        }
        if let Some(event_loop) = self.event_loop.take() {
            event_loop
                .join()
                .map_err(|_| anyhow!("MQTT event loop panicked"))?;
        }
        Ok(())
    }

    fn new(config: &MqttConfig) -> anyhow::Result<Self> {
        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());
        let mut mqttoptions = MqttOptions::new(client_id, &config.host, config.port());
        mqttoptions.set_keep_alive(Duration::from_secs(60));
        if config.use_tls() {
            mqttoptions.set_transport(tls_transport()?);
        }

        //parse the mqtt authentication options
        if let Some((username, password)) = config.credentials() {
            mqttoptions.set_credentials(username, password);
        }

        info!("Connecting to broker {}:{}", config.host, config.port());
        let (client, mut connection) = Client::new(mqttoptions, 512);
        let (sender, incoming) = mpsc::channel::<Notification>();

        let event_loop = thread::spawn(move || {
            // keep polling the event loop to make sure outgoing messages get sent
            // and incoming ones are handed over. Connection errors end the loop,
            // there is no reconnect.
            for notification in connection.iter() {
                match notification {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!("Connected to MQTT broker ({:?})", ack.code);
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = IncomingMessage {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                        };
                        // nobody listening anymore is fine, we keep flushing
                        let _ = sender.send(Ok(message));
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = sender.send(Err(e));
                        break;
                    }
                }
            }
        });

        Ok(Self {
            client,
            incoming,
            event_loop: Some(event_loop),
        })
    }
}
