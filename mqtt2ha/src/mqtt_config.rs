use serde_derive::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub tls: Option<bool>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            client_id: None,
            tls: None,
        }
    }
}

impl MqttConfig {
    pub fn use_tls(&self) -> bool {
        self.tls.is_some_and(|tls| tls)
    }

    /// Configured port, or the IANA default for plain or TLS connections.
    pub fn port(&self) -> u16 {
        self.port
            .unwrap_or_else(|| if self.use_tls() { 8883 } else { 1883 })
    }

    /// Credentials are only sent when a username is configured; a missing
    /// password is sent as an empty one.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (None, _) => None,
            (Some(username), None) => Some((username.clone(), "".into())),
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
        }
    }
}
