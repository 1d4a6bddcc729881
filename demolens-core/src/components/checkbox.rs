//! Boolean input.

use super::{Component, InterpretParams, Neighbors, base_context, expect_bool};
use crate::error::{DemoError, Result};
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::{Value as Json, json};

#[derive(Debug, Clone, Default)]
pub struct Checkbox {
    label: Option<String>,
    default: bool,
}

impl Checkbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn default_value(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

impl Component for Checkbox {
    fn name(&self) -> &'static str {
        "checkbox"
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
        Ok(Value::Bool(expect_bool(self.name(), raw)?))
    }

    fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Bool(b) => Ok(json!(b)),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                self.name(),
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn generate_sample(&self) -> Json {
        json!(true)
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}

    fn get_interpretation_neighbors(&self, raw: &Json) -> Result<Neighbors> {
        let x = expect_bool(self.name(), raw)?;
        Ok(Neighbors::new(vec![json!(!x)]))
    }

    fn get_interpretation_scores(
        &self,
        raw: &Json,
        _neighbors: &Neighbors,
        scores: &[f64],
    ) -> Result<SlotScores> {
        let x = expect_bool(self.name(), raw)?;
        let score = scores.first().copied();
        Ok(if x {
            SlotScores::Binary(score, None)
        } else {
            SlotScores::Binary(None, score)
        })
    }
}
