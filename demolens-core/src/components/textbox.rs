//! Free-text input, interpreted token by token.

use super::{
    Component, InterpretParams, NeighborAux, Neighbors, base_context, expect_f64, expect_str,
    expected_variants, warn_deprecated,
};
use crate::error::{ConfigError, DemoError, Result};
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::{Value as Json, json};
use std::str::FromStr;

/// What [`Textbox::preprocess`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextType {
    #[default]
    Str,
    /// Parses the text as a float.
    ///
    /// Deprecated: use the `Number` component for numeric input.
    Number,
}

impl TextType {
    const NAMES: &'static [&'static str] = &["str", "number"];

    pub fn migration_note(self) -> Option<&'static str> {
        match self {
            Self::Str => None,
            Self::Number => Some("numeric textboxes are deprecated, use the Number component"),
        }
    }
}

impl FromStr for TextType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" => Ok(Self::Str),
            "number" => Ok(Self::Number),
            _ => Err(ConfigError::InvalidType {
                component: "textbox".into(),
                variant: s.into(),
                expected: expected_variants(Self::NAMES),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Textbox {
    label: Option<String>,
    lines: usize,
    placeholder: Option<String>,
    default: String,
    kind: TextType,
    separator: String,
    replacement: Option<String>,
}

impl Default for Textbox {
    fn default() -> Self {
        Self {
            label: None,
            lines: 1,
            placeholder: None,
            default: String::new(),
            kind: TextType::Str,
            separator: " ".into(),
            replacement: None,
        }
    }
}

impl Textbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn lines(mut self, lines: usize) -> Self {
        self.lines = lines.max(1);
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn kind(mut self, kind: TextType) -> Self {
        if let Some(note) = kind.migration_note() {
            warn_deprecated(self.name(), "number", note);
        }
        self.kind = kind;
        self
    }

    /// Set the type from its string name, rejecting unknown names.
    pub fn type_name(self, name: &str) -> Result<Self, ConfigError> {
        Ok(self.kind(name.parse()?))
    }

    /// Split `text` into tokens and build one leave-one-out string per token.
    pub fn tokenize(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let tokens: Vec<String> = text.split(self.separator.as_str()).map(str::to_string).collect();
        let neighbors = (0..tokens.len())
            .map(|index| {
                let mut masked: Vec<&str> = tokens.iter().map(String::as_str).collect();
                match &self.replacement {
                    Some(replacement) => masked[index] = replacement.as_str(),
                    None => {
                        masked.remove(index);
                    }
                }
                masked.join(self.separator.as_str())
            })
            .collect();
        (tokens, neighbors)
    }

    fn join_kept(&self, tokens: &[String], keep: &[bool]) -> String {
        tokens
            .iter()
            .zip(keep)
            .filter_map(|(token, &kept)| match (kept, &self.replacement) {
                (true, _) => Some(token.as_str()),
                (false, Some(replacement)) => Some(replacement.as_str()),
                (false, None) => None,
            })
            .collect::<Vec<_>>()
            .join(self.separator.as_str())
    }
}

impl Component for Textbox {
    fn name(&self) -> &'static str {
        "textbox"
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn template_context(&self) -> Json {
        let mut ctx = base_context(self.name(), self.label());
        ctx.insert("lines".into(), json!(self.lines));
        ctx.insert("placeholder".into(), json!(self.placeholder));
        ctx.insert("default".into(), json!(self.default));
        Json::Object(ctx)
    }

    fn preprocess(&self, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Empty);
        }
        match self.kind {
            TextType::Str => Ok(Value::Text(expect_str(self.name(), raw)?.to_string())),
            TextType::Number => Ok(Value::Number(expect_f64(self.name(), raw)?)),
        }
    }

    fn serialize(&self, value: &Value, _allow_local_access: bool) -> Result<Json> {
        match value {
            Value::Text(s) => Ok(json!(s)),
            Value::Number(x) => Ok(json!(x)),
            Value::Empty => Ok(Json::Null),
            other => Err(DemoError::invalid_value(
                self.name(),
                format!("cannot serialize a {} value", other.kind()),
            )),
        }
    }

    fn generate_sample(&self) -> Json {
        json!("Hello World")
    }

    fn set_interpret_parameters(&mut self, params: &InterpretParams) {
        if let Some(separator) = &params.separator {
            if !separator.is_empty() {
                self.separator = separator.clone();
            }
        }
        if let Some(replacement) = &params.replacement {
            self.replacement = Some(replacement.clone());
        }
    }

    fn interpret_by_tokens(&self) -> bool {
        true
    }

    fn get_interpretation_neighbors(&self, raw: &Json) -> Result<Neighbors> {
        let text = expect_str(self.name(), raw)?;
        let (tokens, neighbors) = self.tokenize(text);
        Ok(Neighbors::with_aux(
            neighbors.into_iter().map(Json::String).collect(),
            NeighborAux::Tokens(tokens),
        ))
    }

    fn get_interpretation_scores(
        &self,
        _raw: &Json,
        neighbors: &Neighbors,
        scores: &[f64],
    ) -> Result<SlotScores> {
        let NeighborAux::Tokens(tokens) = &neighbors.aux else {
            return Err(DemoError::invalid_value(self.name(), "neighbors carry no token list"));
        };
        let mut result = Vec::with_capacity(tokens.len() * 2);
        for (token, score) in tokens.iter().zip(scores) {
            result.push((token.clone(), *score));
            result.push((self.separator.clone(), 0.0));
        }
        Ok(SlotScores::Tokens(result))
    }

    fn shapley_units(&self, neighbors: &Neighbors) -> Option<usize> {
        match &neighbors.aux {
            NeighborAux::Tokens(tokens) => Some(tokens.len()),
            _ => None,
        }
    }

    fn masked_input(&self, _raw: &Json, neighbors: &Neighbors, keep: &[bool]) -> Result<Json> {
        let NeighborAux::Tokens(tokens) = &neighbors.aux else {
            return Err(DemoError::invalid_value(self.name(), "neighbors carry no token list"));
        };
        Ok(Json::String(self.join_kept(tokens, keep)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_and_serialize() {
        let text = Textbox::new();
        assert_eq!(
            text.preprocess(&json!("Hello World!")).unwrap(),
            Value::Text("Hello World!".into())
        );
        assert_eq!(text.preprocess(&Json::Null).unwrap(), Value::Empty);
        assert_eq!(
            text.preprocess_example(&json!("Hello World!")).unwrap(),
            json!("Hello World!")
        );
        assert_eq!(
            text.serialize(&Value::Text("Hello World!".into()), true).unwrap(),
            json!("Hello World!")
        );
        assert!(matches!(
            text.preprocess(&json!(5)),
            Err(DemoError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_numeric_type_parses_float() {
        let numeric = Textbox::new().type_name("number").unwrap();
        assert_eq!(numeric.preprocess(&json!("2")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = Textbox::new().type_name("unknown").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidType { .. }));
    }

    #[test]
    fn test_tokenize_removes_by_default() {
        let text = Textbox::new();
        let (tokens, neighbors) = text.tokenize("Hello World! Demolens speaking.");
        assert_eq!(tokens, vec!["Hello", "World!", "Demolens", "speaking."]);
        assert_eq!(
            neighbors,
            vec![
                "World! Demolens speaking.",
                "Hello Demolens speaking.",
                "Hello World! speaking.",
                "Hello World! Demolens",
            ]
        );
    }

    #[test]
    fn test_tokenize_with_replacement() {
        let text = Textbox::new().with_interpret_parameters(&InterpretParams::new().replacement("unknown"));
        let (_, neighbors) = text.tokenize("Hello World! Demolens speaking.");
        assert_eq!(
            neighbors,
            vec![
                "unknown World! Demolens speaking.",
                "Hello unknown Demolens speaking.",
                "Hello World! unknown speaking.",
                "Hello World! Demolens unknown",
            ]
        );
    }

    #[test]
    fn test_scores_interleave_separators() {
        let text = Textbox::new();
        let neighbors = text.get_interpretation_neighbors(&json!("a bb")).unwrap();
        let scores = text
            .get_interpretation_scores(&json!("a bb"), &neighbors, &[0.0, 1.0])
            .unwrap();
        assert_eq!(
            scores,
            SlotScores::Tokens(vec![
                ("a".into(), 0.0),
                (" ".into(), 0.0),
                ("bb".into(), 1.0),
                (" ".into(), 0.0),
            ])
        );
    }

    #[test]
    fn test_masked_input_keeps_selected_tokens() {
        let text = Textbox::new();
        let raw = json!("the quick fox");
        let neighbors = text.get_interpretation_neighbors(&raw).unwrap();
        assert_eq!(text.shapley_units(&neighbors), Some(3));
        let masked = text.masked_input(&raw, &neighbors, &[true, false, true]).unwrap();
        assert_eq!(masked, json!("the fox"));
    }

    #[test]
    fn test_flag_roundtrip() {
        let text = Textbox::new();
        let dir = tempfile::tempdir().unwrap();
        let stored = text
            .save_flagged(dir.path(), "text_input", &json!("Hello World!"), None)
            .unwrap();
        assert_eq!(stored, json!("Hello World!"));
        assert_eq!(
            text.restore_flagged(dir.path(), &stored, None).unwrap(),
            json!("Hello World!")
        );
        assert!(text.generate_sample().is_string());
    }
}
