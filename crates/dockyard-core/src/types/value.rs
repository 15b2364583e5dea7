//! Variant value held by image variables and builder payloads

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically shaped value from an image definition
///
/// Variables and builder payloads are free-form in definition files. They
/// are kept as a closed set of variants so they survive the YAML round trip
/// performed while rendering templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum VarValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<VarValue>),
    Mapping(BTreeMap<String, VarValue>),
}

impl VarValue {
    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when the value is a mapping
    pub fn get(&self, key: &str) -> Option<&VarValue> {
        match self {
            VarValue::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Whether the value is YAML null
    pub fn is_null(&self) -> bool {
        matches!(self, VarValue::Null)
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Null => write!(f, "null"),
            VarValue::Bool(b) => write!(f, "{}", b),
            VarValue::Integer(i) => write!(f, "{}", i),
            VarValue::Float(n) => write!(f, "{}", n),
            VarValue::String(s) => write!(f, "{}", s),
            VarValue::Sequence(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            VarValue::Mapping(map) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        VarValue::String(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Integer(value)
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        VarValue::Float(value)
    }
}

impl<V: Into<VarValue>> From<Vec<V>> for VarValue {
    fn from(values: Vec<V>) -> Self {
        VarValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<VarValue>> From<BTreeMap<String, V>> for VarValue {
    fn from(values: BTreeMap<String, V>) -> Self {
        VarValue::Mapping(values.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_yaml() {
        let yaml = r#"
name: app
replicas: 3
ratio: 0.5
enabled: true
nothing: ~
ports: [80, 443]
nested:
  key: value
"#;
        let vars: BTreeMap<String, VarValue> = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(vars["name"], VarValue::from("app"));
        assert_eq!(vars["replicas"], VarValue::Integer(3));
        assert_eq!(vars["ratio"], VarValue::Float(0.5));
        assert_eq!(vars["enabled"], VarValue::Bool(true));
        assert!(vars["nothing"].is_null());
        assert_eq!(vars["ports"], VarValue::from(vec![80i64, 443]));
        assert_eq!(vars["nested"].get("key"), Some(&VarValue::from("value")));
    }

    #[test]
    fn test_display() {
        let value = VarValue::from(vec!["a", "b"]);
        assert_eq!(value.to_string(), "[a, b]");
        assert_eq!(VarValue::from("x").as_str(), Some("x"));
        assert_eq!(VarValue::Integer(1).as_str(), None);
    }
}
