//! Input components: per-modality preprocessing, serialization, flagging and
//! perturbation strategies.
//!
//! Every component implements [`Component`]. The interpretation engine only
//! talks to components through this trait, so adding a modality never touches
//! the scoring code.

pub mod audio;
pub mod checkbox;
pub mod checkbox_group;
pub mod choice;
pub mod dataframe;
pub mod file;
pub mod image;
mod media;
pub mod number;
pub mod perturb;
pub mod slider;
pub mod textbox;
pub mod timeseries;
pub mod video;

pub use audio::{Audio, AudioType};
pub use checkbox::Checkbox;
pub use checkbox_group::CheckboxGroup;
pub use choice::{ChoiceType, Dropdown, Radio};
pub use dataframe::{Dataframe, DataframeType};
pub use file::{File, FileCount, FileType};
pub use self::image::{Image, ImageMode, ImageType};
pub use number::Number;
pub use perturb::{DeltaType, InterpretParams, NeighborAux, Neighbors};
pub use slider::Slider;
pub use textbox::{TextType, Textbox};
pub use timeseries::Timeseries;
pub use video::{Video, VideoType};

use crate::error::{DemoError, InterpretationError, Result};
use crate::flagging::FlagMetadata;
use crate::interpret::SlotScores;
use crate::value::Value;
use serde_json::Value as Json;
use std::fmt;
use std::path::Path;

/// A typed input modality.
///
/// Raw values are wire-shaped JSON (strings, numbers, data URLs, nested
/// objects); [`preprocess`](Component::preprocess) turns them into the
/// [`Value`] the wrapped function receives. Neighbors are produced in raw
/// form so the engine can feed them through the same preprocessing.
pub trait Component: fmt::Debug + Send + Sync {
    /// Registered type name, lowercase.
    fn name(&self) -> &'static str;

    fn label(&self) -> Option<&str>;

    /// Description of the component for UIs.
    fn template_context(&self) -> Json;

    /// Convert a raw value into the function-ready value. Missing raw values become
    /// [`Value::Empty`], except on components declared non-optional.
    fn preprocess(&self, raw: &Json) -> Result<Value>;

    /// Lighter conversion used to display canned examples.
    fn preprocess_example(&self, example: &Json) -> Result<Json> {
        Ok(example.clone())
    }

    /// Convert a processed value (or a path) back into its wire form.
    fn serialize(&self, value: &Value, allow_local_access: bool) -> Result<Json>;

    /// Persist a raw value under `dir` and return a reference to it.
    fn save_flagged(
        &self,
        _dir: &Path,
        _slot: &str,
        value: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        Ok(value.clone())
    }

    /// Inverse of [`save_flagged`](Component::save_flagged).
    fn restore_flagged(
        &self,
        _dir: &Path,
        stored: &Json,
        _metadata: Option<&FlagMetadata>,
    ) -> Result<Json> {
        Ok(stored.clone())
    }

    /// One representative raw value.
    fn generate_sample(&self) -> Json;

    /// Reconfigure perturbation behavior. Parameters that do not apply are ignored.
    fn set_interpret_parameters(&mut self, params: &InterpretParams);

    /// Chained form of [`set_interpret_parameters`](Component::set_interpret_parameters).
    fn with_interpret_parameters(mut self, params: &InterpretParams) -> Self
    where
        Self: Sized,
    {
        self.set_interpret_parameters(params);
        self
    }

    /// Whether neighbors remove units (tokens, regions) rather than move the value.
    fn interpret_by_tokens(&self) -> bool {
        false
    }

    fn get_interpretation_neighbors(&self, _raw: &Json) -> Result<Neighbors> {
        Err(DemoError::unsupported(self.name(), "interpretation neighbors"))
    }

    /// Map one score per neighbor (or per unit, in Shapley mode) onto this component's score shape.
    fn get_interpretation_scores(
        &self,
        _raw: &Json,
        _neighbors: &Neighbors,
        _scores: &[f64],
    ) -> Result<SlotScores> {
        Err(DemoError::unsupported(self.name(), "interpretation scores"))
    }

    /// Number of players for Shapley attribution, if this component decomposes into units.
    fn shapley_units(&self, _neighbors: &Neighbors) -> Option<usize> {
        None
    }

    /// Rebuild a raw value in which only the units with `keep[i]` hold their original state.
    fn masked_input(&self, _raw: &Json, _neighbors: &Neighbors, _keep: &[bool]) -> Result<Json> {
        Err(InterpretationError::UnsupportedMethod {
            component: self.name().to_string(),
            method: "shapley".to_string(),
        }
        .into())
    }
}

pub(crate) fn expect_str<'a>(component: &str, raw: &'a Json) -> Result<&'a str> {
    raw.as_str()
        .ok_or_else(|| DemoError::invalid_value(component, format!("expected a string, got {raw}")))
}

pub(crate) fn expect_f64(component: &str, raw: &Json) -> Result<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| DemoError::invalid_value(component, format!("expected a number, got {raw}")))
}

pub(crate) fn expect_bool(component: &str, raw: &Json) -> Result<bool> {
    raw.as_bool()
        .ok_or_else(|| DemoError::invalid_value(component, format!("expected a boolean, got {raw}")))
}

pub(crate) fn expect_str_list(component: &str, raw: &Json) -> Result<Vec<String>> {
    let items = raw
        .as_array()
        .ok_or_else(|| DemoError::invalid_value(component, format!("expected a list, got {raw}")))?;
    items
        .iter()
        .map(|item| expect_str(component, item).map(str::to_string))
        .collect()
}

/// Result of preprocessing a missing raw value: empty when `optional`, an error otherwise.
pub(crate) fn missing_value(component: &str, optional: bool) -> Result<Value> {
    if optional {
        Ok(Value::Empty)
    } else {
        Err(DemoError::invalid_value(component, "a value is required"))
    }
}

/// Render a list of accepted variant names for error messages.
pub(crate) fn expected_variants(names: &[&str]) -> String {
    names.join(", ")
}

/// Log the migration note of a deprecated type variant once, at construction.
pub(crate) fn warn_deprecated(component: &str, variant: &str, note: &str) {
    tracing::warn!(component, variant, "Deprecated type variant: {note}");
}

/// Shared `name`/`label` fields of every template context.
pub(crate) fn base_context(name: &str, label: Option<&str>) -> serde_json::Map<String, Json> {
    let mut map = serde_json::Map::new();
    map.insert("name".into(), Json::from(name));
    map.insert("label".into(), label.map_or(Json::Null, Json::from));
    map
}

/// Read a flagged JSON-text reference back into a value.
pub(crate) fn restore_json_text(component: &str, stored: &Json) -> Result<Json> {
    let text = expect_str(component, stored)?;
    Ok(serde_json::from_str(text)?)
}
