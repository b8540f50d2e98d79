//! Client for the local web UI of SMA Sunny Boy inverters.

use anyhow::{anyhow, Context};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::{json, Map, Value};

// Object ids of the measurements in the getAllOnlValues response
pub const DC_POWER_CODE: &str = "6380_40251E00";
pub const DC_VOLTAGE_CODE: &str = "6380_40451F00";
pub const DC_CURRENT_CODE: &str = "6380_40452100";
pub const TOTAL_YIELD_CODE: &str = "6400_00260100";
pub const DAILY_YIELD_CODE: &str = "6400_00262200";

const TRACKER_SECTIONS: [(&str, &str); 3] = [
    (DC_POWER_CODE, "DC Power"),
    (DC_VOLTAGE_CODE, "DC Voltage"),
    (DC_CURRENT_CODE, "DC Current"),
];

const TOTAL_SECTIONS: [(&str, &str); 2] = [
    (TOTAL_YIELD_CODE, "Total Yield"),
    (DAILY_YIELD_CODE, "Daily Yield"),
];

const LOCALE_COOKIE: &str = "tmhDynamicLocale.locale=en-us";

/// Measurements of one inverter, ready to be published as JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct InverterReading {
    pub serial: String,
    pub values: Map<String, Value>,
}

impl InverterReading {
    pub fn to_json(&self) -> String {
        Value::Object(self.values.clone()).to_string()
    }
}

pub struct SmaClient {
    http: Client,
    base_url: String,
    sid: Option<String>,
}

impl SmaClient {
    /// `base_url` is the scheme and host of the inverter, e.g. `https://192.168.1.20`.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(header::ORIGIN, HeaderValue::from_str(&base_url)?);
        headers.insert(header::REFERER, HeaderValue::from_str(&base_url)?);

        // the inverter serves a self-signed certificate
        let http = Client::builder()
            .danger_accept_invalid_certs(true)
            .default_headers(headers)
            .build()
            .context("could not create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            sid: None,
        })
    }

    fn cookie(&self) -> anyhow::Result<HeaderValue> {
        let cookie = match &self.sid {
            Some(sid) => format!(
                r#"{LOCALE_COOKIE}; user443={{"role":{{"bitMask":2,"title":"usr","loginLevel":1}},"username":861,"sid": "{sid}"}}"#
            ),
            None => LOCALE_COOKIE.to_string(),
        };
        Ok(HeaderValue::from_str(&cookie)?)
    }

    fn sid(&self) -> anyhow::Result<&str> {
        self.sid
            .as_deref()
            .ok_or_else(|| anyhow!("not logged in to inverter"))
    }

    fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");

        let mut request = self
            .http
            .post(&url)
            .header(header::COOKIE, self.cookie()?)
            .json(body);
        if let Some(sid) = &self.sid {
            request = request.query(&[("sid", sid)]);
        }
        let response = request
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// Logs in as user and keeps the session id for the following requests.
    pub fn login(&mut self, password: &str) -> anyhow::Result<()> {
        let response = self.post("/dyn/login.json", &json!({"right": "usr", "pass": password}))?;
        let sid = session_id(&response)
            .ok_or_else(|| anyhow!("Unable to login to inverter web UI. Response: {response}"))?;
        info!("Logged in to inverter at {}", self.base_url);
        self.sid = Some(sid.to_string());
        Ok(())
    }

    pub fn get_all_online_values(&self) -> anyhow::Result<Value> {
        self.sid()?;
        self.post("/dyn/getAllOnlValues.json", &json!({"destDev": []}))
    }

    pub fn logout(&mut self) -> anyhow::Result<()> {
        self.sid()?;
        self.post("/dyn/logout.json", &json!({"destDev": []}))?;
        info!("Logged out from inverter at {}", self.base_url);
        self.sid = None;
        Ok(())
    }
}

pub fn session_id(login_response: &Value) -> Option<&str> {
    login_response["result"]["sid"].as_str()
}

/// Picks the tracker and yield measurements of every inverter out of a
/// getAllOnlValues response.
pub fn extract_readings(all_values: &Value) -> Vec<InverterReading> {
    let Some(inverters) = all_values["result"].as_object() else {
        return Vec::new();
    };
    inverters
        .iter()
        .map(|(serial, values)| InverterReading {
            serial: serial.clone(),
            values: extract_values(serial, values),
        })
        .collect()
}

fn extract_values(serial: &str, values: &Value) -> Map<String, Value> {
    let mut reading = Map::new();

    for (code, section) in TRACKER_SECTIONS {
        let trackers: Map<String, Value> = measurements(values, code)
            .iter()
            .enumerate()
            .map(|(index, measurement)| {
                (format!("Tracker{}", index + 1), measurement_value(measurement))
            })
            .collect();
        // a section without any tracker is left out
        if !trackers.is_empty() {
            reading.insert(section.to_string(), Value::Object(trackers));
        }
    }

    for (code, section) in TOTAL_SECTIONS {
        let total = measurements(values, code)
            .first()
            .map(measurement_value)
            .unwrap_or(Value::Null);
        reading.insert(section.to_string(), total);
    }

    reading.insert("Inverter".to_string(), Value::String(serial.to_string()));
    reading
}

fn measurements<'a>(values: &'a Value, code: &str) -> &'a [Value] {
    values[code]["1"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn measurement_value(measurement: &Value) -> Value {
    measurement.get("val").cloned().unwrap_or(Value::Null)
}
