use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expression::Bindings;

/// Scalar supplied for a named input variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl InputValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            InputValue::Boolean(_) => "boolean",
            InputValue::Integer(_) => "integer",
            InputValue::Float(_) => "float",
            InputValue::Text(_) => "string",
        }
    }

    /// Numeric view of integers and floats; booleans are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InputValue::Integer(value) => Some(*value as f64),
            InputValue::Float(value) => Some(*value),
            InputValue::Boolean(_) | InputValue::Text(_) => None,
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Boolean(value) => write!(f, "{value}"),
            InputValue::Integer(value) => write!(f, "{value}"),
            InputValue::Float(value) => write!(f, "{value}"),
            InputValue::Text(value) => write!(f, "'{value}'"),
        }
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Boolean(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Integer(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        InputValue::Integer(i64::from(value))
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Float(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Text(value)
    }
}

/// Per-request input values keyed by variable name.
///
/// Sorted keys keep serialisation canonical, which the audit checksum relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    values: BTreeMap<String, InputValue>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InputValue)> {
        self.values.iter()
    }
}

impl FromIterator<(String, InputValue)> for EvaluationContext {
    fn from_iter<T: IntoIterator<Item = (String, InputValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Bindings for EvaluationContext {
    fn lookup(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialises_each_scalar_kind() {
        let context: EvaluationContext = serde_json::from_str(
            r#"{ "income": 900000, "ratio": 0.25, "state": "IA", "veteran": true }"#,
        )
        .expect("context parses");

        assert_eq!(context.get("income"), Some(&InputValue::Integer(900000)));
        assert_eq!(context.get("ratio"), Some(&InputValue::Float(0.25)));
        assert_eq!(context.get("state"), Some(&InputValue::Text("IA".to_string())));
        assert_eq!(context.get("veteran"), Some(&InputValue::Boolean(true)));
    }

    #[test]
    fn rejects_nested_values() {
        let parsed = serde_json::from_str::<EvaluationContext>(r#"{ "income": [1, 2] }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn serialises_with_sorted_keys() {
        let context = EvaluationContext::new().with("zeta", 1).with("alpha", "a");
        let json = serde_json::to_string(&context).expect("serialises");
        assert_eq!(json, r#"{"alpha":"a","zeta":1}"#);
    }
}
