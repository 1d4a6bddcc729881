//! Bounded numeric input.

use super::perturb::numeric_neighbors;
use super::{Component, DeltaType, InterpretParams, Neighbors, base_context, expect_f64};
use crate::error::{ConfigError, DemoError, Result};
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::{Value as Json, json};

#[derive(Debug, Clone)]
pub struct Slider {
    label: Option<String>,
    minimum: f64,
    maximum: f64,
    step: f64,
    default: Option<f64>,
    steps: usize,
    delta: Option<f64>,
    delta_type: DeltaType,
}

impl Default for Slider {
    fn default() -> Self {
        Self {
            label: None,
            minimum: 0.0,
            maximum: 100.0,
            step: 1.0,
            default: None,
            steps: 3,
            delta: None,
            delta_type: DeltaType::Absolute,
        }
    }
}

impl Slider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slider over `[minimum, maximum]`. Rejects empty ranges.
    pub fn range(mut self, minimum: f64, maximum: f64) -> Result<Self, ConfigError> {
        if minimum.is_nan() || maximum.is_nan() || minimum > maximum {
            return Err(ConfigError::InvalidParameter {
                component: "slider".into(),
                parameter: "maximum".into(),
                reason: format!("maximum {maximum} is below minimum {minimum}"),
            });
        }
        self.minimum = minimum;
        self.maximum = maximum;
        Ok(self)
    }

    pub fn step(mut self, step: f64) -> Result<Self, ConfigError> {
        if step <= 0.0 || !step.is_finite() {
            return Err(ConfigError::InvalidParameter {
                component: "slider".into(),
                parameter: "step".into(),
                reason: format!("step must be positive, got {step}"),
            });
        }
        self.step = step;
        Ok(self)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn default_value(mut self, default: f64) -> Self {
        self.default = Some(default.clamp(self.minimum, self.maximum));
        self
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Number-style neighbors of `x`, clamped to the slider range.
    pub fn neighbors_of(&self, x: f64) -> Vec<f64> {
        let delta = self.delta.unwrap_or(self.step);
        numeric_neighbors(x, self.steps, delta, self.delta_type)
            .into_iter()
            .map(|n| n.clamp(self.minimum, self.maximum))
            .collect()
    }
}

impl Component for Slider {
    fn name(&self) -> &'static str {
        "slider"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("minimum".into(), json!(self.minimum));
        ctx.insert("maximum".into(), json!(self.maximum));
        ctx.insert("step".into(), json!(self.step));
        ctx.insert("default".into(), json!(self.default.unwrap_or(self.minimum)));
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
        json!(self.default.unwrap_or(self.maximum))
    }

    fn set_interpret_parameters(&mut self, params: &InterpretParams) {
        if let Some(steps) = params.steps {
            self.steps = steps;
        }
        if let Some(delta) = params.delta {
            self.delta = Some(delta);
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
        _raw: &Json,
        _neighbors: &Neighbors,
        scores: &[f64],
    ) -> Result<SlotScores> {
        Ok(SlotScores::Flat(scores.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_context() {
        let slider = Slider::new().range(10.0, 20.0).unwrap().label("Slider Input");
        assert_eq!(
            slider.template_context(),
            json!({
                "name": "slider",
                "label": "Slider Input",
                "minimum": 10.0,
                "maximum": 20.0,
                "step": 1.0,
                "default": 10.0,
            })
        );
    }

    #[test]
    fn test_neighbors_stay_in_range() {
        let slider = Slider::new().range(10.0, 20.0).unwrap().step(1.0).unwrap();
        for x in [10.0, 11.0, 15.0, 19.0, 20.0] {
            let neighbors = slider.get_interpretation_neighbors(&json!(x)).unwrap();
            assert_eq!(neighbors.len(), 6);
            for n in &neighbors.values {
                let n = n.as_f64().unwrap();
                assert!((10.0..=20.0).contains(&n), "{n} outside range for {x}");
            }
        }
        let middle = slider.neighbors_of(15.0);
        assert_eq!(middle, vec![12.0, 13.0, 14.0, 16.0, 17.0, 18.0]);
    }

    #[test]
    fn test_neighbors_clamp_at_the_edges() {
        let slider = Slider::new().range(10.0, 20.0).unwrap().step(1.0).unwrap();
        assert_eq!(
            slider.neighbors_of(20.0),
            vec![17.0, 18.0, 19.0, 20.0, 20.0, 20.0]
        );
        assert_eq!(
            slider.neighbors_of(10.0),
            vec![10.0, 10.0, 10.0, 11.0, 12.0, 13.0]
        );
    }

    #[test]
    fn test_flat_scores() {
        let slider = Slider::new();
        let raw = json!(50);
        let neighbors = slider.get_interpretation_neighbors(&raw).unwrap();
        let scores = slider
            .get_interpretation_scores(&raw, &neighbors, &[1.0, 2.0])
            .unwrap();
        assert_eq!(scores, SlotScores::Flat(vec![1.0, 2.0]));
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(Slider::new().range(5.0, 1.0).is_err());
        assert!(Slider::new().step(0.0).is_err());
    }

    #[test]
    fn test_preprocess_and_flag() {
        let slider = Slider::new();
        assert_eq!(slider.preprocess(&json!(42)).unwrap(), Value::Number(42.0));
        assert_eq!(slider.preprocess(&Json::Null).unwrap(), Value::Empty);
        let dir = tempfile::tempdir().unwrap();
        let stored = slider.save_flagged(dir.path(), "slider_input", &json!(42), None).unwrap();
        assert_eq!(slider.restore_flagged(dir.path(), &stored, None).unwrap(), json!(42));
    }
}
