//! The wrapped function boundary: what it receives and what it returns.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output of a wrapped prediction function.
///
/// The interpretation engine picks its distance measure from the variant:
/// numbers and numeric text are compared arithmetically, labels by equality,
/// and confidences by the baseline label's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Prediction {
    Number(f64),
    Text(String),
    Label(String),
    Confidences(Vec<(String, f64)>),
}

impl Prediction {
    /// Classify an arbitrary JSON output by its shape.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::Bool(b) => Some(Self::Number(if *b { 1.0 } else { 0.0 })),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Object(map) => {
                if let Some(serde_json::Value::String(label)) = map.get("label") {
                    return Some(Self::Label(label.clone()));
                }
                let confidences = map
                    .iter()
                    .map(|(k, v)| v.as_f64().map(|c| (k.clone(), c)))
                    .collect::<Option<Vec<_>>>()?;
                Some(Self::Confidences(confidences))
            }
            _ => None,
        }
    }

    /// Numeric reading of the output, when it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Text(s) | Self::Label(s) => s.trim().parse().ok(),
            Self::Confidences(_) => None,
        }
    }

    /// The label this output predicts: the text itself, or the most confident class.
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Number(x) => Some(x.to_string()),
            Self::Text(s) | Self::Label(s) => Some(s.clone()),
            Self::Confidences(c) => c
                .iter()
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(label, _)| label.clone()),
        }
    }

    /// Confidence assigned to `label`, if this is a confidence output.
    pub fn confidence_of(&self, label: &str) -> Option<f64> {
        match self {
            Self::Confidences(c) => c.iter().find(|(l, _)| l == label).map(|(_, v)| *v),
            _ => None,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => write!(f, "{x}"),
            Self::Text(s) | Self::Label(s) => write!(f, "{s}"),
            Self::Confidences(c) => {
                let parts: Vec<String> = c.iter().map(|(l, v)| format!("{l}: {v:.4}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<f64> for Prediction {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<i64> for Prediction {
    fn from(x: i64) -> Self {
        Self::Number(x as f64)
    }
}

impl From<usize> for Prediction {
    fn from(x: usize) -> Self {
        Self::Number(x as f64)
    }
}

impl From<bool> for Prediction {
    fn from(b: bool) -> Self {
        Self::Number(if b { 1.0 } else { 0.0 })
    }
}

impl From<String> for Prediction {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Prediction {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A function under demonstration: one preprocessed value per input slot in, one output out.
///
/// Implemented for every `Fn(&[Value]) -> anyhow::Result<Prediction>`, so closures work directly.
pub trait Predictor {
    fn predict(&self, inputs: &[Value]) -> anyhow::Result<Prediction>;
}

impl<F> Predictor for F
where
    F: Fn(&[Value]) -> anyhow::Result<Prediction>,
{
    fn predict(&self, inputs: &[Value]) -> anyhow::Result<Prediction> {
        self(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_detects_shape() {
        assert_eq!(Prediction::from_json(&json!(4)), Some(Prediction::Number(4.0)));
        assert_eq!(
            Prediction::from_json(&json!("olleH")),
            Some(Prediction::Text("olleH".into()))
        );
        assert_eq!(
            Prediction::from_json(&json!({"label": "cat"})),
            Some(Prediction::Label("cat".into()))
        );
        let conf = Prediction::from_json(&json!({"cat": 0.75, "dog": 0.25})).unwrap();
        assert_eq!(conf.confidence_of("cat"), Some(0.75));
        assert_eq!(conf.label().as_deref(), Some("cat"));
        assert!(Prediction::from_json(&json!([1, 2])).is_none());
        assert!(Prediction::from_json(&json!({"cat": "high"})).is_none());
    }

    #[test]
    fn test_numeric_text_parses() {
        assert_eq!(Prediction::from("8").as_number(), Some(8.0));
        assert_eq!(Prediction::from("0|2").as_number(), None);
        assert_eq!(Prediction::from(3usize).as_number(), Some(3.0));
    }

    #[test]
    fn test_closure_is_predictor() {
        let double = |inputs: &[Value]| -> anyhow::Result<Prediction> {
            let x = inputs[0].as_number().unwrap_or_default();
            Ok(Prediction::Number(2.0 * x))
        };
        let out = double.predict(&[Value::Number(2.0)]).unwrap();
        assert_eq!(out, Prediction::Number(4.0));
    }
}
