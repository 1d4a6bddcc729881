//! Numeric input.

use super::perturb::numeric_neighbors;
use super::{Component, DeltaType, InterpretParams, Neighbors, base_context, expect_f64};
use crate::error::{DemoError, Result};
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::{Value as Json, json};

#[derive(Debug, Clone)]
pub struct Number {
    label: Option<String>,
    default: Option<f64>,
    steps: usize,
    delta: f64,
    delta_type: DeltaType,
}

impl Default for Number {
    fn default() -> Self {
        Self {
            label: None,
            default: None,
            steps: 3,
            delta: 1.0,
            delta_type: DeltaType::Percent,
        }
    }
}

impl Number {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn default_value(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    /// Neighbors of `x` under the current interpretation settings.
    pub fn neighbors_of(&self, x: f64) -> Vec<f64> {
        numeric_neighbors(x, self.steps, self.delta, self.delta_type)
    }
}

impl Component for Number {
    fn name(&self) -> &'static str {
        "number"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("default".into(), json!(self.default));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Empty);
        }
        Ok(Value::Number(expect_f64(self.name(), raw)?))
    }

    fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Number(x) => Ok(json!(x)),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                self.name(),
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn generate_sample(&self) -> Json {
        json!(self.default.unwrap_or(1.0))
    }

    fn set_interpret_parameters(&mut self, params: &InterpretParams) {
        if let Some(steps) = params.steps {
            self.steps = steps;
        }
        if let Some(delta) = params.delta {
            self.delta = delta;
        }
        if let Some(delta_type) = params.delta_type {
            self.delta_type = delta_type;
        }
    }

    fn get_interpretation_neighbors(&self, raw: &Json) -> Result<Neighbors> {
        let x = expect_f64(self.name(), raw)?;
        Ok(Neighbors::new(
            self.neighbors_of(x).into_iter().map(|n| json!(n)).collect(),
        ))
    }

    fn get_interpretation_scores(
        &self,
        raw: &Json,
        neighbors: &Neighbors,
        scores: &[f64],
    ) -> Result<SlotScores> {
        let x = expect_f64(self.name(), raw)?;
        let mut pairs = neighbors
            .values
            .iter()
            .zip(scores)
            .map(|(n, s)| Ok((expect_f64(self.name(), n)?, Some(*s))))
            .collect::<Result<Vec<_>>>()?;
        pairs.insert(pairs.len() / 2, (x, None));
        Ok(SlotScores::Numeric(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(neighbors: &Neighbors) -> Vec<f64> {
        neighbors.values.iter().map(|v| v.as_f64().unwrap()).collect()
    }

    #[test]
    fn test_preprocess_and_serialize() {
        let number = Number::new();
        assert_eq!(number.preprocess(&json!(3)).unwrap(), Value::Number(3.0));
        assert_eq!(number.preprocess_example(&json!(3)).unwrap(), json!(3));
        assert_eq!(number.serialize(&Value::Number(3.0), true).unwrap(), json!(3.0));
        assert!(number.generate_sample().is_f64());
    }

    #[test]
    fn test_neighbors_absolute_and_percent() {
        let mut number = Number::new();
        number.set_interpret_parameters(
            &InterpretParams::new().steps(3).delta(1.0).delta_type(DeltaType::Absolute),
        );
        let neighbors = number.get_interpretation_neighbors(&json!(1)).unwrap();
        assert_eq!(values(&neighbors), vec![-2.0, -1.0, 0.0, 2.0, 3.0, 4.0]);
        assert_eq!(neighbors.aux, super::super::NeighborAux::None);

        number.set_interpret_parameters(&InterpretParams::new().delta_type(DeltaType::Percent));
        let neighbors = number.get_interpretation_neighbors(&json!(1)).unwrap();
        for (got, want) in values(&neighbors).iter().zip([0.97, 0.98, 0.99, 1.01, 1.02, 1.03]) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_neighbors_of_zero_exclude_zero() {
        let neighbors = Number::new().neighbors_of(0.0);
        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.iter().all(|n| *n != 0.0));
        assert!(neighbors.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_scores_insert_original_at_midpoint() {
        let number = Number::new();
        let raw = json!(2);
        let neighbors = number.get_interpretation_neighbors(&raw).unwrap();
        let scores = number
            .get_interpretation_scores(&raw, &neighbors, &[-3.0, -2.0, -1.0, 1.0, 2.0, 3.0])
            .unwrap();
        let SlotScores::Numeric(pairs) = scores else {
            panic!("expected numeric scores");
        };
        assert_eq!(pairs.len(), 7);
        assert_eq!(pairs[3], (2.0, None));
        assert_eq!(pairs[0].1, Some(-3.0));
        assert_eq!(pairs[6].1, Some(3.0));
    }

    #[test]
    fn test_flag_roundtrip() {
        let number = Number::new();
        let dir = tempfile::tempdir().unwrap();
        let stored = number.save_flagged(dir.path(), "numeric_input", &json!(3), None).unwrap();
        assert_eq!(stored, json!(3));
        assert_eq!(number.restore_flagged(dir.path(), &stored, None).unwrap(), json!(3));
    }
}
