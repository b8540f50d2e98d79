use std::collections::VecDeque;
use std::time::Duration;

use mqtt2ha::{
    home_assistant::{build_discovery_messages, HomeAssistant},
    mqtt_config::MqttConfig,
    mqtt_wrapper::{IncomingMessage, MqttWrapper, QoS},
    receiver::receive_json,
    simple_mqtt::SimpleMqtt,
    sma::extract_readings,
    ha_yaml, NestedValue, UnitTable,
};
use serde_json::{json, Value};

struct MqttTester {
    subscriptions: Vec<String>,
    published_values: Vec<(String, Vec<u8>, bool)>,
    incoming: VecDeque<IncomingMessage>,
    disconnected: bool,
}

impl MqttTester {
    pub fn len(&self) -> usize {
        self.published_values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn deliver(&mut self, topic: &str, payload: &[u8]) {
        self.incoming.push_back(IncomingMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }

    fn published_json(&self, index: usize) -> (&str, Value) {
        let (topic, payload, _) = &self.published_values[index];
        (topic.as_str(), serde_json::from_slice(payload).unwrap())
    }
}

impl MqttWrapper for MqttTester {
    fn subscribe(&mut self, topic: &str, _qos: QoS) -> anyhow::Result<()> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish<S, V>(&mut self, topic: S, _qos: QoS, retain: bool, payload: V) -> anyhow::Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        self.published_values
            .push((topic.into(), payload.into(), retain));
        Ok(())
    }

    // an exhausted queue behaves like a timeout
    fn recv(&mut self, _timeout: Option<Duration>) -> anyhow::Result<Option<IncomingMessage>> {
        Ok(self.incoming.pop_front())
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        self.disconnected = true;
        Ok(())
    }

    fn new(_config: &MqttConfig) -> anyhow::Result<Self> {
        Ok(Self {
            subscriptions: Vec::new(),
            published_values: Vec::new(),
            incoming: VecDeque::new(),
            disconnected: false,
        })
    }
}

fn tester() -> MqttTester {
    MqttTester::new(&MqttConfig {
        host: "frob".to_owned(),
        port: Some(1234),
        username: None,
        password: None,
        tls: None,
        client_id: Some("myclient".to_string()),
    })
    .unwrap()
}

#[test]
fn publish_one_message() {
    let mut mqtt = tester();
    let result = mqtt.publish("foo", QoS::AtMostOnce, true, "Hooray".to_string());
    assert!(result.is_ok());
    assert!(!mqtt.is_empty());
    assert_eq!(mqtt.len(), 1);
}

#[test]
fn receive_skips_unusable_payloads() {
    let mut mqtt = tester();
    mqtt.deliver("sma/3012345678", b"not json");
    mqtt.deliver("sma/3012345678", b"21.5");
    mqtt.deliver("other/topic", br#"{"ignored": true}"#);
    mqtt.deliver("sma/3012345678", br#"{"Daily Yield": 5400}"#);
    mqtt.deliver("sma/3012345678", br#"{"second": 1}"#);

    let received = receive_json(&mut mqtt, "sma/3012345678", None)
        .unwrap()
        .unwrap();
    assert_eq!(mqtt.subscriptions, ["sma/3012345678"]);
    assert_eq!(received.topic, "sma/3012345678");
    assert_eq!(received.root, NestedValue::from(json!({"Daily Yield": 5400})));
    // later messages stay queued
    assert_eq!(mqtt.incoming.len(), 1);
}

#[test]
fn receive_reports_actual_topic_of_wildcard_subscription() {
    let mut mqtt = tester();
    mqtt.deliver("sensors/kitchen", br#"{"Temperature": 72.5}"#);

    let received = receive_json(&mut mqtt, "sensors/+", Some(Duration::from_secs(5)))
        .unwrap()
        .unwrap();
    assert_eq!(received.topic, "sensors/kitchen");
}

#[test]
fn receive_gives_up_without_message() {
    let mut mqtt = tester();
    mqtt.deliver("sensors/kitchen", b"[1, 2, 3]");
    let received = receive_json(&mut mqtt, "sensors/kitchen", Some(Duration::from_millis(10)));
    assert!(received.unwrap().is_none());
}

#[test]
fn discovery_configs_are_published_retained() {
    let mut mqtt = tester();
    mqtt.deliver(
        "sma/3012345678",
        br#"{"DC Power": {"Tracker1": 120, "Tracker2": 118}, "Inverter": "3012345678"}"#,
    );
    let received = receive_json(&mut mqtt, "sma/#", None).unwrap().unwrap();

    let messages = build_discovery_messages(
        &received.topic,
        &received.root,
        &UnitTable::default(),
        "homeassistant",
    )
    .unwrap();
    let published = HomeAssistant::new(&mut mqtt).publish_configs(&messages);
    mqtt.disconnect().unwrap();

    assert_eq!(published, 3);
    assert_eq!(mqtt.len(), 3);
    assert!(mqtt.published_values.iter().all(|(_, _, retain)| *retain));
    assert!(mqtt.disconnected);

    let (topic, payload) = mqtt.published_json(1);
    assert_eq!(
        topic,
        "homeassistant/sensor/3012345678/dc_power_tracker2/config"
    );
    assert_eq!(payload["name"], "Dc Power Tracker2");
    assert_eq!(payload["unit_of_measurement"], "W");
    assert_eq!(payload["unique_id"], "3012345678_dc_power_tracker2");
    assert_eq!(
        payload["value_template"],
        r#"{{ value_json["DC Power"]["Tracker2"] | round(2) }}"#
    );

    let (_, payload) = mqtt.published_json(2);
    assert_eq!(payload["name"], "Inverter");
    assert!(payload.get("unit_of_measurement").is_none());
}

#[test]
fn yaml_from_received_message() {
    let mut mqtt = tester();
    mqtt.deliver("room/climate", br#"{"Temperature": 72.5, "Humidity": 40}"#);
    let received = receive_json(&mut mqtt, "room/climate", None)
        .unwrap()
        .unwrap();

    let yaml = ha_yaml::generate(&received.topic, &received.root).unwrap();
    let document: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let sensors = document["mqtt"]["sensor"].as_sequence().unwrap();
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[1]["name"].as_str(), Some("Humidity"));
    assert_eq!(sensors[1]["state_topic"].as_str(), Some("room/climate"));
}

#[test]
fn sma_readings_are_published_per_inverter() {
    let all_values = json!({
        "result": {
            "0199-AAAA": {"6380_40251E00": {"1": [{"val": 100}]}},
            "0199-BBBB": {"6400_00262200": {"1": [{"val": 5400}]}}
        }
    });
    let readings = extract_readings(&all_values);

    let mut mqtt = tester();
    let mut publisher = SimpleMqtt::new(&mut mqtt, "solar/sma/");
    for reading in &readings {
        assert!(publisher.publish(reading));
    }

    assert_eq!(mqtt.len(), 2);
    let (topic, payload) = mqtt.published_json(0);
    assert_eq!(topic, "solar/sma/0199-AAAA");
    assert_eq!(payload["DC Power"]["Tracker1"], 100);
    assert_eq!(payload["Inverter"], "0199-AAAA");
    assert!(!mqtt.published_values[0].2);

    // the relayed payload feeds straight into discovery
    let root = NestedValue::from_payload(&mqtt.published_values[1].1).unwrap();
    let messages =
        build_discovery_messages("solar/sma/0199-BBBB", &root, &UnitTable::default(), "ha")
            .unwrap();
    let topics: Vec<_> = messages.iter().map(|m| m.topic.as_str()).collect();
    assert_eq!(
        topics,
        [
            "ha/sensor/0199-BBBB/total_yield/config",
            "ha/sensor/0199-BBBB/daily_yield/config",
            "ha/sensor/0199-BBBB/inverter/config",
        ]
    );
}
