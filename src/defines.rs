use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::errors::{PreprocessError, Result};

/// A configuration value. Only booleans, numbers and strings can be defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }

    /// Parse a command-line style value: JSON scalar if it parses as one, else a plain string.
    pub fn parse_loose(raw: &str) -> Scalar {
        serde_json::from_str::<Scalar>(raw).unwrap_or_else(|_| Scalar::String(raw.to_string()))
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<f64> for Scalar {
    // Non-finite floats have no JSON form; they degrade to a string.
    fn from(f: f64) -> Self {
        Number::from_f64(f)
            .map(Scalar::Number)
            .unwrap_or_else(|| Scalar::String(f.to_string()))
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => write!(f, "{s}"),
        }
    }
}

/// Flat `dotted.key -> scalar` configuration, kept in insertion order.
///
/// Keys are unique. Re-inserting a key replaces its value but keeps the
/// position of the first insertion, so context building sees the same
/// order a JSON object literal would give.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Defines {
    entries: Vec<(String, Scalar)>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Apply every entry of `other` on top of `self`.
    pub fn extend_from(&mut self, other: Defines) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON object of scalars, e.g. `{"device.isMobile": true}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| PreprocessError::Config(format!("invalid defines JSON: {e}")))?;
        Defines::try_from(map)
    }
}

impl TryFrom<Map<String, Value>> for Defines {
    type Error = PreprocessError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        let mut defines = Defines::new();
        for (key, value) in map {
            let scalar = serde_json::from_value::<Scalar>(value.clone()).map_err(|_| {
                PreprocessError::Config(format!(
                    "define `{key}` must be a boolean, number or string, got {value}"
                ))
            })?;
            defines.insert(key, scalar);
        }
        Ok(defines)
    }
}

impl From<Defines> for Map<String, Value> {
    fn from(defines: Defines) -> Self {
        defines
            .entries
            .into_iter()
            .map(|(k, v)| (k, v.to_value()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Defines {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut defines = Defines::new();
        for (k, v) in iter {
            defines.insert(k, v);
        }
        defines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_flat_object_in_order() {
        let d = Defines::from_json_str(r#"{"b.x": 1, "a": true, "c": "s"}"#).unwrap();
        let keys: Vec<&str> = d.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b.x", "a", "c"]);
        assert_eq!(d.get("a"), Some(&Scalar::Bool(true)));
        assert_eq!(d.get("c"), Some(&Scalar::String("s".into())));
    }

    #[test]
    fn rejects_non_scalars() {
        for bad in [r#"{"a": null}"#, r#"{"a": [1]}"#, r#"{"a": {"b": 1}}"#, "[1]"] {
            let err = Defines::from_json_str(bad).unwrap_err();
            assert_eq!(err.kind(), crate::errors::ErrorKind::Config, "{bad}");
        }
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut d: Defines = [("a", 1), ("b", 2)].into_iter().collect();
        d.insert("a", 3);
        let entries: Vec<(&str, String)> = d.iter().map(|(k, v)| (k, v.to_string())).collect();
        assert_eq!(entries, vec![("a", "3".to_string()), ("b", "2".to_string())]);
    }

    #[test]
    fn loose_parsing() {
        assert_eq!(Scalar::parse_loose("true"), Scalar::Bool(true));
        assert_eq!(Scalar::parse_loose("375"), Scalar::from(375));
        assert_eq!(Scalar::parse_loose("\"B\""), Scalar::from("B"));
        assert_eq!(Scalar::parse_loose("en-US"), Scalar::from("en-US"));
    }
}
