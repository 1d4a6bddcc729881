//! Per-slot score shapes returned by interpretation.

use serde::{Deserialize, Serialize};

/// Scores for one input slot, shaped by the slot's component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scores", rename_all = "snake_case")]
pub enum SlotScores {
    /// `(token, score)` pairs; separators between tokens are listed with score 0.
    Tokens(Vec<(String, f64)>),
    /// `(neighbor value, score)` pairs with the original value inserted at the midpoint as `(x, None)`.
    Numeric(Vec<(f64, Option<f64>)>),
    /// One score per neighbor.
    Flat(Vec<f64>),
    /// One entry per choice, `None` at the currently selected choice.
    Choices(Vec<Option<f64>>),
    /// `(score if flipped from true, score if flipped from false)`.
    Binary(Option<f64>, Option<f64>),
    /// `[score if removed, score if added]` per choice, in choice order.
    Pairs(Vec<[Option<f64>; 2]>),
    /// Row-major per-pixel scores.
    Pixels(Vec<Vec<f64>>),
    /// The slot was not interpreted.
    Skipped,
}

impl SlotScores {
    /// Number of score entries, counting each pair or pixel row once.
    pub fn len(&self) -> usize {
        match self {
            Self::Tokens(v) => v.len(),
            Self::Numeric(v) => v.len(),
            Self::Flat(v) => v.len(),
            Self::Choices(v) => v.len(),
            Self::Binary(..) => 1,
            Self::Pairs(v) => v.len(),
            Self::Pixels(v) => v.len(),
            Self::Skipped => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scores of the token entries, skipping separators.
    pub fn token_scores(&self, separator: &str) -> Vec<(&str, f64)> {
        match self {
            Self::Tokens(v) => v
                .iter()
                .filter(|(t, _)| t != separator)
                .map(|(t, s)| (t.as_str(), *s))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let scores = SlotScores::Binary(None, Some(1.0));
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "binary", "scores": [null, 1.0]}));
        assert_eq!(SlotScores::Skipped.len(), 0);
    }

    #[test]
    fn test_token_scores_skip_separators() {
        let scores = SlotScores::Tokens(vec![
            ("a".into(), 0.5),
            (" ".into(), 0.0),
            ("b".into(), 1.0),
            (" ".into(), 0.0),
        ]);
        assert_eq!(scores.token_scores(" "), vec![("a", 0.5), ("b", 1.0)]);
    }
}
