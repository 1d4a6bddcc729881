//! Single-choice inputs: [`Radio`] and [`Dropdown`].
//!
//! Both share one implementation and differ only in their registered name.

use super::{
    Component, InterpretParams, Neighbors, base_context, expect_str, expected_variants,
};
use crate::error::{ConfigError, DemoError, Result};
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::{Value as Json, json};
use std::str::FromStr;

/// Whether choices reach the wrapped function by value or by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChoiceType {
    #[default]
    Value,
    Index,
}

impl ChoiceType {
    const NAMES: &'static [&'static str] = &["value", "index"];

    pub(crate) fn parse_for(component: &str, s: &str) -> Result<Self, ConfigError> {
        match s {
            "value" => Ok(Self::Value),
            "index" => Ok(Self::Index),
            _ => Err(ConfigError::InvalidType {
                component: component.into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

impl FromStr for ChoiceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_for("choice", s)
    }
}

pub(crate) fn validate_choices(component: &str, choices: &[String]) -> Result<(), ConfigError> {
    if choices.is_empty() {
        return Err(ConfigError::InvalidParameter {
            component: component.into(),
            parameter: "choices".into(),
            reason: "at least one choice is required".into(),
        });
    }
    for (i, choice) in choices.iter().enumerate() {
        if choices[..i].contains(choice) {
            return Err(ConfigError::InvalidParameter {
                component: component.into(),
                parameter: "choices".into(),
                reason: format!("duplicate choice '{choice}'"),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct SingleChoice {
    choices: Vec<String>,
    kind: ChoiceType,
    label: Option<String>,
    default: Option<String>,
}

impl SingleChoice {
    fn new(component: &str, choices: Vec<String>) -> Result<Self, ConfigError> {
        validate_choices(component, &choices)?;
        Ok(Self {
            choices,
            kind: ChoiceType::Value,
            label: None,
            default: None,
        })
    }

    fn position(&self, component: &str, raw: &Json) -> Result<usize> {
        let value = expect_str(component, raw)?;
        self.choices.iter().position(|c| c == value).ok_or_else(|| {
            DemoError::invalid_value(component, format!("'{value}' is not one of the choices"))
        })
    }

    fn context(&self, component: &str) -> Json {
        let mut ctx = base_context(component, self.label.as_deref());
        ctx.insert("choices".into(), json!(self.choices));
        ctx.insert(
            "default".into(),
            json!(self.default.as_ref().or(self.choices.first())),
        );
        Json::Object(ctx)
    }

    fn preprocess(&self, component: &str, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Empty);
        }
        match self.kind {
            ChoiceType::Value => Ok(Value::Text(expect_str(component, raw)?.to_string())),
            ChoiceType::Index => Ok(Value::Index(self.position(component, raw)?)),
        }
    }

    fn serialize(&self, component: &str, value: &Value) -> Result<Json> {
        match value {
            Value::Text(s) => Ok(json!(s)),
            Value::Index(i) => self.choices.get(*i).map(|c| json!(c)).ok_or_else(|| {
                DemoError::invalid_value(component, format!("choice index {i} out of range"))
            }),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                component,
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn neighbors(&self, component: &str, raw: &Json) -> Result<Neighbors> {
        let selected = self.position(component, raw)?;
        Ok(Neighbors::new(
            self.choices
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != selected)
                .map(|(_, c)| json!(c))
                .collect(),
        ))
    }

    fn scores(&self, component: &str, raw: &Json, scores: &[f64]) -> Result<SlotScores> {
        let selected = self.position(component, raw)?;
        let mut out: Vec<Option<f64>> = scores.iter().copied().map(Some).collect();
        out.insert(selected.min(out.len()), None);
        Ok(SlotScores::Choices(out))
    }
}

macro_rules! single_choice_component {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            inner: SingleChoice,
        }

        impl $ty {
            /// Create with a non-empty list of distinct choices.
            pub fn new<I, S>(choices: I) -> Result<Self, ConfigError>
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let choices = choices.into_iter().map(Into::into).collect();
                Ok(Self {
                    inner: SingleChoice::new($name, choices)?,
                })
            }

            pub fn label(mut self, label: impl Into<String>) -> Self {
                self.inner.label = Some(label.into());
                self
            }

            pub fn kind(mut self, kind: ChoiceType) -> Self {
                self.inner.kind = kind;
                self
            }

            pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
                Ok(self.kind(ChoiceType::parse_for($name, name)?))
            }

            pub fn default_value(mut self, default: impl Into<String>) -> Result<Self, ConfigError> {
                let default = default.into();
                if !self.inner.choices.contains(&default) {
                    return Err(ConfigError::InvalidParameter {
                        component: $name.into(),
                        parameter: "default".into(),
                        reason: format!("'{default}' is not one of the choices"),
                    });
                }
                self.inner.default = Some(default);
                Ok(self)
            }

            pub fn choices(&self) -> &[String] {
                &self.inner.choices
            }
        }

        impl Component for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn label(&self) -> Option<&str> {
                self.inner.label.as_deref()
            }

            fn template_context(&self) -> Json {
                self.inner.context($name)
            }

            fn preprocess(&self, raw: &Json) -> Result<Value> {
                self.inner.preprocess($name, raw)
            }

            fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
                self.inner.serialize($name, value)
            }

            fn generate_sample(&self) -> Json {
                json!(self.inner.choices.first())
            }

            fn set_interpret_parameters(&mut self, _params: &InterpretParams) {}

            fn get_interpretation_neighbors(&self, raw: &Json) -> Result<Neighbors> {
                self.inner.neighbors($name, raw)
            }

            fn get_interpretation_scores(
                &self,
                raw: &Json,
                _neighbors: &Neighbors,
                scores: &[f64],
            ) -> Result<SlotScores> {
                self.inner.scores($name, raw, scores)
            }
        }
    };
}

single_choice_component!(
    /// A set of mutually exclusive options shown side by side.
    Radio,
    "radio"
);

single_choice_component!(
    /// A set of mutually exclusive options in a drop-down menu.
    Dropdown,
    "dropdown"
);
