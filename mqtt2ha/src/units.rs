use std::collections::HashMap;

use crate::flatten::KeyPath;

/// Units of measurement for the top-level categories the inverter and
/// environment sensors report.
const BUILTIN_UNITS: [(&str, &str); 8] = [
    ("DC Power", "W"),
    ("DC Voltage", "mV"),
    ("DC Current", "mA"),
    ("Total Yield", "Wh"),
    ("Daily Yield", "Wh"),
    ("Temperature", "°F"),
    ("Humidity", "%"),
    ("AQI", "µg/m³"),
];

/// Maps the first key of a path to a unit of measurement.
///
/// Built once at startup and only read afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitTable {
    units: HashMap<String, String>,
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::from_iter(BUILTIN_UNITS)
    }
}

impl UnitTable {
    pub fn empty() -> Self {
        Self {
            units: HashMap::new(),
        }
    }

    /// Adds entries, replacing the unit of categories that are already known.
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.units.extend(
            overrides
                .into_iter()
                .map(|(category, unit)| (category.into(), unit.into())),
        );
        self
    }

    pub fn infer_unit(&self, path: &KeyPath) -> Option<&str> {
        self.units.get(path.first()?).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UnitTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::empty().with_overrides(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> KeyPath {
        segments.iter().copied().collect()
    }

    #[test]
    fn unit_comes_from_first_segment() {
        let units = UnitTable::default();
        assert_eq!(units.infer_unit(&path(&["DC Power", "Tracker1"])), Some("W"));
        assert_eq!(units.infer_unit(&path(&["DC Power", "Tracker2"])), Some("W"));
        assert_eq!(units.infer_unit(&path(&["Total Yield"])), Some("Wh"));
        assert_eq!(units.infer_unit(&path(&["Tracker1", "DC Power"])), None);
    }

    #[test]
    fn unknown_category_has_no_unit() {
        let units = UnitTable::default();
        assert_eq!(units.infer_unit(&path(&["Inverter"])), None);
        assert_eq!(units.infer_unit(&KeyPath::new()), None);
    }

    #[test]
    fn temperature_depends_on_table() {
        let temperature = path(&["Temperature"]);
        assert_eq!(UnitTable::empty().infer_unit(&temperature), None);
        assert_eq!(UnitTable::default().infer_unit(&temperature), Some("°F"));

        let celsius = UnitTable::default().with_overrides([("Temperature", "°C")]);
        assert_eq!(celsius.infer_unit(&temperature), Some("°C"));
        assert_eq!(celsius.len(), BUILTIN_UNITS.len());
    }
}
