//! Multi-select input.

use super::choice::{ChoiceType, validate_choices};
use super::{
    Component, InterpretParams, Neighbors, base_context, expect_str_list, restore_json_text,
};
use crate::error::{ConfigError, DemoError, Result};
use crate::flagging::FlagMetadata;
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::{Value as Json, json};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct CheckboxGroup {
    choices: Vec<String>,
    kind: ChoiceType,
    label: Option<String>,
    default: Vec<String>,
}

impl CheckboxGroup {
    /// Create with a non-empty list of distinct choices.
    pub fn new<I, S>(choices: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        validate_choices("checkboxgroup", &choices)?;
        Ok(Self {
            choices,
            kind: ChoiceType::Value,
            label: None,
            default: Vec::new(),
        })
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(mut self, kind: ChoiceType) -> Self {
        self.kind = kind;
        self
    }

    pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
        Ok(self.kind(ChoiceType::parse_for("checkboxgroup", name)?))
    }

    pub fn default_value<I, S>(mut self, selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default = selected.into_iter().map(Into::into).collect();
        self
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    fn index_of(&self, choice: &str) -> Result<usize> {
        self.choices.iter().position(|c| c == choice).ok_or_else(|| {
            DemoError::invalid_value(self.name(), format!("'{choice}' is not one of the choices"))
        })
    }

    /// Selection with each choice toggled where `keep` is false.
    ///
    /// Kept selections retain their order; newly selected choices are
    /// appended in choice order.
    fn toggled(&self, selected: &[String], keep: &[bool]) -> Vec<String> {
        let keep_of = |choice: &String| {
            self.choices
                .iter()
                .position(|c| c == choice)
                .and_then(|i| keep.get(i).copied())
                .unwrap_or(true)
        };
        let mut out: Vec<String> = selected.iter().filter(|c| keep_of(c)).cloned().collect();
        out.extend(
            self.choices
                .iter()
                .filter(|c| !selected.contains(c) && !keep_of(c))
                .cloned(),
        );
        out
    }
}

impl Component for CheckboxGroup {
    fn name(&self) -> &'static str {
        "checkboxgroup"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("choices".into(), json!(self.choices));
        ctx.insert("default".into(), json!(self.default));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Empty);
        }
        let selected = expect_str_list(self.name(), raw)?;
        match self.kind {
            ChoiceType::Value => Ok(Value::Choices(selected)),
            ChoiceType::Index => Ok(Value::Indices(
                selected
                    .iter()
                    .map(|c| self.index_of(c))
                    .collect::<Result<_>>()?,
            )),
        }
    }

    fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Choices(selected) => Ok(json!(selected)),
            Value::Indices(indices) => indices
                .iter()
                .map(|i| {
                    self.choices.get(*i).map(|c| json!(c)).ok_or_else(|| {
                        DemoError::invalid_value(self.name(), format!("choice index {i} out of range"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Json::Array),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                self.name(),
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn save_flagged(
        &self,
        _dir: &Path,
        _slot: &str,
        value: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        Ok(Json::String(serde_json::to_string(value)?))
    }

    fn restore_flagged(
        &self,
        _dir: &Path,
        stored: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        restore_json_text(self.name(), stored)
    }

    fn generate_sample(&self) -> Json {
        json!(self.choices.first().into_iter().collect::<Vec<_>>())
    }

    fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}

    fn get_interpretation_neighbors(&self, raw: &Json) -> Result<Neighbors> {
        let selected = expect_str_list(self.name(), raw)?;
        let values = (0..self.choices.len())
            .map(|i| {
                let mut keep = vec![true; self.choices.len()];
                keep[i] = false;
                json!(self.toggled(&selected, &keep))
            })
            .collect();
        Ok(Neighbors::new(values))
    }

    fn get_interpretation_scores(
        &self,
        raw: &Json,
        _neighbors: &Neighbors,
        scores: &[f64],
    ) -> Result<SlotScores> {
        let selected = expect_str_list(self.name(), raw)?;
        Ok(SlotScores::Pairs(
            self.choices
                .iter()
                .zip(scores)
                .map(|(choice, &score)| {
                    if selected.contains(choice) {
                        [Some(score), None]
                    } else {
                        [None, Some(score)]
                    }
                })
                .collect(),
        ))
    }

    fn shapley_units(&self, _neighbors: &Neighbors) -> Option<usize> {
        Some(self.choices.len())
    }

    fn masked_input(&self, raw: &Json, _neighbors: &Neighbors, keep: &[bool]) -> Result<Json> {
        let selected = expect_str_list(self.name(), raw)?;
        Ok(json!(self.toggled(&selected, keep)))
    }
}
