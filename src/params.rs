//! Configuration values exchanged with the model and the harness

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TunerError};

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Hyperparameter name -> value
pub type Configuration = BTreeMap<String, ParamValue>;

impl ParamValue {
    /// Convert a decoded JSON scalar. Arrays, objects and null are rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(ParamValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(ParamValue::Int)
                .or_else(|| n.as_f64().map(ParamValue::Float)),
            Value::String(s) => Some(ParamValue::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric view (ints widen to float)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Equality that treats `1` and `1.0` as the same choice
    pub fn matches(&self, other: &ParamValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Decode a JSON object into a configuration.
pub fn parse_configuration(text: &str) -> Result<Configuration> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| TunerError::malformed(format!("invalid JSON: {}", e), text))?;

    let Value::Object(map) = value else {
        return Err(TunerError::malformed("expected a JSON object", text));
    };

    map.iter()
        .map(|(name, value)| {
            ParamValue::from_json(value)
                .map(|v| (name.clone(), v))
                .ok_or_else(|| {
                    TunerError::malformed(format!("non-scalar value for {}", name), text)
                })
        })
        .collect()
}

/// Render a configuration as a single-line JSON object, e.g. `{"C": 1.0, "gamma": 0.1}`
pub fn render_line(config: &Configuration) -> String {
    let entries: Vec<String> = config
        .iter()
        .map(|(name, value)| {
            let key = serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name));
            let value = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
            format!("{}: {}", key, value)
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entries: &[(&str, ParamValue)]) -> Configuration {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_keeps_keys_and_values() {
        let parsed = parse_configuration(r#"{"C": 1.0, "gamma": 0.1}"#).unwrap();
        assert_eq!(
            parsed,
            config(&[("C", ParamValue::Float(1.0)), ("gamma", ParamValue::Float(0.1))])
        );
    }

    #[test]
    fn test_parse_mixed_scalars() {
        let parsed =
            parse_configuration(r#"{"kernel": "rbf", "degree": 3, "shrinking": true}"#).unwrap();
        assert_eq!(parsed["kernel"], ParamValue::Text("rbf".to_string()));
        assert_eq!(parsed["degree"], ParamValue::Int(3));
        assert_eq!(parsed["shrinking"], ParamValue::Bool(true));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(
            parse_configuration("[1, 2]"),
            Err(TunerError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_configuration("use C=1"),
            Err(TunerError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_configuration(r#"{"layers": [64, 32]}"#),
            Err(TunerError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_render_line_parses_back() {
        let original = config(&[
            ("C", ParamValue::Float(1.0)),
            ("gamma", ParamValue::Float(0.1)),
            ("kernel", ParamValue::Text("rbf".to_string())),
            ("max_iter", ParamValue::Int(200)),
        ]);
        let line = render_line(&original);
        assert_eq!(
            line,
            r#"{"C": 1.0, "gamma": 0.1, "kernel": "rbf", "max_iter": 200}"#
        );
        assert!(!line.contains('\n'));
        assert_eq!(parse_configuration(&line).unwrap(), original);
    }

    #[test]
    fn test_value_views() {
        assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(ParamValue::Float(4.5).as_i64(), None);
        assert!(ParamValue::Int(1).matches(&ParamValue::Float(1.0)));
        assert!(!ParamValue::Text("1".to_string()).matches(&ParamValue::Int(1)));
    }
}
