//! Preprocessed values handed to the wrapped function.

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A value in the shape the wrapped function expects.
///
/// Produced by [`Component::preprocess`](crate::components::Component::preprocess)
/// and owned by the call in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The raw value was missing.
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Selected choices, by value.
    Choices(Vec<String>),
    /// Selected choices, by position in the component's choice list.
    Indices(Vec<usize>),
    /// A single choice, by position.
    Index(usize),
    /// Image pixels as height x width x channels.
    Pixels(Array3<u8>),
    Image(image::DynamicImage),
    Audio(AudioClip),
    Path(PathBuf),
    Paths(Vec<PathBuf>),
    /// File contents held in memory.
    Bytes(Vec<u8>),
    Table(Table),
    Matrix(Array2<f64>),
    Rows(Vec<Vec<serde_json::Value>>),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Index(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_pixels(&self) -> Option<&Array3<u8>> {
        match self {
            Self::Pixels(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Short variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Choices(_) => "choices",
            Self::Indices(_) => "indices",
            Self::Index(_) => "index",
            Self::Pixels(_) => "pixels",
            Self::Image(_) => "image",
            Self::Audio(_) => "audio",
            Self::Path(_) => "path",
            Self::Paths(_) => "paths",
            Self::Bytes(_) => "bytes",
            Self::Table(_) => "table",
            Self::Matrix(_) => "matrix",
            Self::Rows(_) => "rows",
        }
    }
}

/// Decoded PCM audio with interleaved integer samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: Vec<i32>,
}

impl AudioClip {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }
}

/// A column-labelled table of JSON cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of a named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&serde_json::Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Wire form: `{"headers": [...], "data": [[...], ...]}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "headers": self.headers,
            "data": self.rows,
        })
    }
}
