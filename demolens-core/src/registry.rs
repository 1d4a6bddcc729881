//! Component registry: maps type names and shorthands to component constructors.
//!
//! Names are matched case-insensitively and must be unique under that rule.
//! The built-in table is populated once on first use.

use crate::components::{
    Audio, Checkbox, CheckboxGroup, Component, Dataframe, Dropdown, File, Image, Number, Radio,
    Slider, Textbox, Timeseries, Video,
};
use crate::error::ConfigError;
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Constructor options, e.g. `{"label": "Age", "minimum": 0, "maximum": 120}`.
pub type Options = Map<String, Json>;

/// Builds a component from its options.
pub type Factory = fn(&Options) -> Result<Box<dyn Component>, ConfigError>;

#[derive(Clone)]
struct Entry {
    /// Canonical type name the entry constructs.
    component: &'static str,
    factory: Factory,
    /// Options applied before the caller's, for aliases such as `numpy`.
    preset: &'static [(&'static str, &'static str)],
}

/// Registered component types, keyed by lowercase name.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in component and shorthand.
    pub fn with_builtins() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for &(name, factory) in BUILTIN_TYPES {
            registry.register(name, factory)?;
        }
        for &(alias, target, preset) in BUILTIN_ALIASES {
            registry.register_alias(alias, target, preset)?;
        }
        Ok(registry)
    }

    /// Register a component type. Fails if the name is taken, ignoring case.
    pub fn register(&mut self, name: &'static str, factory: Factory) -> Result<(), ConfigError> {
        self.insert(
            name,
            Entry {
                component: name,
                factory,
                preset: &[],
            },
        )
    }

    /// Register another name for an already registered type, with preset options.
    pub fn register_alias(
        &mut self,
        alias: &'static str,
        target: &str,
        preset: &'static [(&'static str, &'static str)],
    ) -> Result<(), ConfigError> {
        let entry = self
            .entries
            .get(&target.to_lowercase())
            .ok_or_else(|| ConfigError::UnknownComponent {
                name: target.to_string(),
            })?;
        let entry = Entry {
            preset,
            ..entry.clone()
        };
        self.insert(alias, entry)
    }

    fn insert(&mut self, name: &str, entry: Entry) -> Result<(), ConfigError> {
        let key = name.to_lowercase();
        if self.entries.contains_key(&key) {
            return Err(ConfigError::DuplicateComponent {
                name: name.to_string(),
            });
        }
        debug!(name = %key, component = entry.component, "Registering component type");
        self.order.push(key.clone());
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Construct the component registered under `name` with default options.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn Component>, ConfigError> {
        self.resolve_with(name, &Options::new())
    }

    /// Construct the component registered under `name`.
    pub fn resolve_with(
        &self,
        name: &str,
        options: &Options,
    ) -> Result<Box<dyn Component>, ConfigError> {
        let entry = self
            .entries
            .get(&name.to_lowercase())
            .ok_or_else(|| ConfigError::UnknownComponent {
                name: name.to_string(),
            })?;
        let mut merged: Options = entry
            .preset
            .iter()
            .map(|&(k, v)| (k.to_string(), Json::from(v)))
            .collect();
        merged.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
        (entry.factory)(&merged)
    }

    /// Canonical type name behind `name`, if registered.
    pub fn component_of(&self, name: &str) -> Option<&'static str> {
        self.entries.get(&name.to_lowercase()).map(|e| e.component)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static BUILTIN: LazyLock<ComponentRegistry> = LazyLock::new(|| {
    ComponentRegistry::with_builtins().expect("built-in component names are unique")
});

/// The built-in registry.
pub fn builtin() -> &'static ComponentRegistry {
    &BUILTIN
}

/// Resolve a built-in type name or shorthand.
pub fn resolve(name: &str) -> Result<Box<dyn Component>, ConfigError> {
    BUILTIN.resolve(name)
}

/// Resolve a built-in type name or shorthand with constructor options.
pub fn resolve_with(name: &str, options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    BUILTIN.resolve_with(name, options)
}

const BUILTIN_TYPES: &[(&str, Factory)] = &[
    ("textbox", build_textbox),
    ("number", build_number),
    ("slider", build_slider),
    ("checkbox", build_checkbox),
    ("checkboxgroup", build_checkbox_group),
    ("radio", build_radio),
    ("dropdown", build_dropdown),
    ("image", build_image),
    ("audio", build_audio),
    ("file", build_file),
    ("dataframe", build_dataframe),
    ("video", build_video),
    ("timeseries", build_timeseries),
];

type Alias = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const BUILTIN_ALIASES: &[Alias] = &[
    ("text", "textbox", &[]),
    ("numpy", "dataframe", &[("type", "numpy")]),
    ("matrix", "dataframe", &[("type", "numpy")]),
    ("list", "dataframe", &[("type", "array")]),
];

/// Choices used when a choice component is resolved without any.
const PLACEHOLDER_CHOICES: [&str; 3] = ["choice 1", "choice 2", "choice 3"];

struct OptionReader<'a> {
    component: &'static str,
    options: &'a Options,
}

impl<'a> OptionReader<'a> {
    fn new(component: &'static str, options: &'a Options) -> Self {
        Self { component, options }
    }

    fn invalid(&self, key: &str, expected: &str) -> ConfigError {
        ConfigError::InvalidParameter {
            component: self.component.into(),
            parameter: key.into(),
            reason: format!("expected {expected}"),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Json> {
        self.options.get(key).filter(|v| !v.is_null())
    }

    fn str(&self, key: &str) -> Result<Option<&'a str>, ConfigError> {
        self.get(key)
            .map(|v| v.as_str().ok_or_else(|| self.invalid(key, "a string")))
            .transpose()
    }

    fn f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        self.get(key)
            .map(|v| v.as_f64().ok_or_else(|| self.invalid(key, "a number")))
            .transpose()
    }

    fn usize(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        self.get(key)
            .map(|v| {
                v.as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| self.invalid(key, "a non-negative integer"))
            })
            .transpose()
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|v| v.as_bool().ok_or_else(|| self.invalid(key, "a boolean")))
            .transpose()
    }

    /// A list of strings; a single string is accepted as a one-element list.
    fn strings(&self, key: &str) -> Result<Option<Vec<String>>, ConfigError> {
        self.get(key)
            .map(|v| match v {
                Json::String(s) => Ok(vec![s.clone()]),
                Json::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| self.invalid(key, "a list of strings")),
                _ => Err(self.invalid(key, "a list of strings")),
            })
            .transpose()
    }

    fn choices(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .strings("choices")?
            .unwrap_or_else(|| PLACEHOLDER_CHOICES.iter().map(|c| c.to_string()).collect()))
    }
}

fn build_textbox(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("textbox", options);
    let mut c = Textbox::new();
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    if let Some(lines) = o.usize("lines")? {
        c = c.lines(lines);
    }
    if let Some(placeholder) = o.str("placeholder")? {
        c = c.placeholder(placeholder);
    }
    if let Some(default) = o.str("default")? {
        c = c.default_value(default);
    }
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    Ok(Box::new(c))
}

fn build_number(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("number", options);
    let mut c = Number::new();
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    if let Some(default) = o.f64("default")? {
        c = c.default_value(default);
    }
    Ok(Box::new(c))
}

fn build_slider(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("slider", options);
    let mut c = Slider::new();
    let minimum = o.f64("minimum")?.unwrap_or(c.minimum());
    let maximum = o.f64("maximum")?.unwrap_or(c.maximum());
    c = c.range(minimum, maximum)?;
    if let Some(step) = o.f64("step")? {
        c = c.step(step)?;
    }
    if let Some(default) = o.f64("default")? {
        c = c.default_value(default);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

fn build_checkbox(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("checkbox", options);
    let mut c = Checkbox::new();
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    if let Some(default) = o.bool("default")? {
        c = c.default_value(default);
    }
    Ok(Box::new(c))
}

fn build_checkbox_group(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("checkboxgroup", options);
    let mut c = CheckboxGroup::new(o.choices()?)?;
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    if let Some(default) = o.strings("default")? {
        c = c.default_value(default);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

macro_rules! build_single_choice {
    ($fn_name:ident, $ty:ident, $name:literal) => {
        fn $fn_name(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
            let o = OptionReader::new($name, options);
            let mut c = $ty::new(o.choices()?)?;
            if let Some(kind) = o.str("type")? {
                c = c.type_name(kind)?;
            }
            if let Some(default) = o.str("default")? {
                c = c.default_value(default)?;
            }
            if let Some(label) = o.str("label")? {
                c = c.label(label);
            }
            Ok(Box::new(c))
        }
    };
}

build_single_choice!(build_radio, Radio, "radio");
build_single_choice!(build_dropdown, Dropdown, "dropdown");

fn build_image(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("image", options);
    let mut c = Image::new();
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    if let Some(mode) = o.str("image_mode")? {
        c = c.mode(mode.parse()?);
    }
    if let Some(shape) = o.get("shape") {
        let dims = shape
            .as_array()
            .filter(|d| d.len() == 2)
            .and_then(|d| Some((d[0].as_u64()?, d[1].as_u64()?)))
            .and_then(|(w, h)| Some((u32::try_from(w).ok()?, u32::try_from(h).ok()?)))
            .ok_or_else(|| o.invalid("shape", "[width, height]"))?;
        c = c.shape(dims.0, dims.1)?;
    }
    if let Some(invert) = o.bool("invert_colors")? {
        c = c.invert_colors(invert);
    }
    if let Some(source) = o.str("source")? {
        c = c.source(source);
    }
    if let Some(tool) = o.str("tool")? {
        c = c.tool(tool);
    }
    if let Some(optional) = o.bool("optional")? {
        c = c.optional(optional);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

fn build_audio(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("audio", options);
    let mut c = Audio::new();
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    if let Some(source) = o.str("source")? {
        c = c.source(source);
    }
    if let Some(optional) = o.bool("optional")? {
        c = c.optional(optional);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

fn build_file(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("file", options);
    let mut c = File::new();
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    if let Some(count) = o.str("file_count")? {
        c = c.file_count(count.parse()?)?;
    }
    if let Some(optional) = o.bool("optional")? {
        c = c.optional(optional);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

fn build_dataframe(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("dataframe", options);
    let mut c = Dataframe::new();
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    if let Some(headers) = o.strings("headers")? {
        c = c.headers(headers);
    }
    if let Some(datatype) = o.get("datatype") {
        c = c.datatype(datatype.clone());
    }
    if let Some(rows) = o.usize("row_count")? {
        c = c.row_count(rows);
    }
    if let Some(cols) = o.usize("col_count")? {
        c = c.col_count(cols);
    }
    if let Some(width) = o.usize("col_width")? {
        let width = u32::try_from(width).map_err(|_| o.invalid("col_width", "a pixel width"))?;
        c = c.col_width(width);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

fn build_video(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("video", options);
    let mut c = Video::new();
    if let Some(kind) = o.str("type")? {
        c = c.type_name(kind)?;
    }
    if let Some(source) = o.str("source")? {
        c = c.source(source);
    }
    if let Some(optional) = o.bool("optional")? {
        c = c.optional(optional);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}

fn build_timeseries(options: &Options) -> Result<Box<dyn Component>, ConfigError> {
    let o = OptionReader::new("timeseries", options);
    let x = o.str("x")?.unwrap_or("time");
    let y = o.strings("y")?.unwrap_or_else(|| vec!["value".to_string()]);
    let mut c = Timeseries::new(x, y)?;
    if let Some(optional) = o.bool("optional")? {
        c = c.optional(optional);
    }
    if let Some(label) = o.str("label")? {
        c = c.label(label);
    }
    Ok(Box::new(c))
}
