//! Shared perturbation types and numeric neighbor generation.

use crate::error::ConfigError;
use crate::segmentation::SegmentMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::str::FromStr;

/// How a numeric `delta` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaType {
    /// Fixed offset.
    Absolute,
    /// Percentage of the value's magnitude.
    #[default]
    Percent,
}

impl FromStr for DeltaType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(Self::Absolute),
            "percent" | "percentage" => Ok(Self::Percent),
            _ => Err(ConfigError::InvalidParameter {
                component: "number".into(),
                parameter: "delta_type".into(),
                reason: format!("unknown delta type '{s}', expected absolute or percent"),
            }),
        }
    }
}

/// Interpretation parameters accepted by every component.
///
/// Each component reads the fields that apply to it and ignores the rest;
/// unset fields keep the component's current setting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpretParams {
    /// Neighbors generated on each side of a numeric value.
    pub steps: Option<usize>,
    pub delta: Option<f64>,
    pub delta_type: Option<DeltaType>,
    /// Token substituted for a removed text token; removal when unset.
    pub replacement: Option<String>,
    /// Token separator for text.
    pub separator: Option<String>,
    /// Fill color for removed image regions.
    pub replacement_color: Option<[u8; 3]>,
    /// Approximate superpixel count for image segmentation.
    pub segments: Option<usize>,
}

impl InterpretParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn delta_type(mut self, delta_type: DeltaType) -> Self {
        self.delta_type = Some(delta_type);
        self
    }

    pub fn replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn replacement_color(mut self, color: [u8; 3]) -> Self {
        self.replacement_color = Some(color);
        self
    }

    pub fn segments(mut self, segments: usize) -> Self {
        self.segments = Some(segments);
        self
    }
}

/// Auxiliary data produced alongside neighbors.
#[derive(Debug, Clone, PartialEq)]
pub enum NeighborAux {
    None,
    /// The units a text value was split into.
    Tokens(Vec<String>),
    /// Superpixel regions of an image.
    Segments(SegmentMap),
}

/// Ordered perturbed raw values for one input slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    pub values: Vec<Json>,
    pub aux: NeighborAux,
}

impl Neighbors {
    pub fn new(values: Vec<Json>) -> Self {
        Self {
            values,
            aux: NeighborAux::None,
        }
    }

    pub fn with_aux(values: Vec<Json>, aux: NeighborAux) -> Self {
        Self { values, aux }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `n` evenly spaced points from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// `steps` points below and `steps` points above `x`, spaced by `delta`, ascending.
///
/// The original value itself is never included. A percent delta around zero
/// falls back to the absolute `delta`.
pub fn numeric_neighbors(x: f64, steps: usize, delta: f64, delta_type: DeltaType) -> Vec<f64> {
    let delta = match delta_type {
        DeltaType::Percent if x != 0.0 => (delta * x / 100.0).abs(),
        _ => delta.abs(),
    };
    let reach = steps as f64 * delta;
    let mut out = linspace(x - reach, x - delta, steps);
    out.extend(linspace(x + delta, x + reach, steps));
    out
}
