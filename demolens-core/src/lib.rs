//! # Demolens Core
//!
//! Typed input components for interactive model demos and a model-agnostic
//! interpretation engine. Provides component preprocessing and
//! serialization, flagging persistence, the component registry, leave-one-out
//! and Shapley interpretation, configuration, and error types.

pub mod codec;
pub mod components;
pub mod config;
pub mod error;
pub mod flagging;
pub mod interpret;
pub mod prediction;
pub mod registry;
pub mod segmentation;
pub mod value;

// Re-export commonly used types at the crate root.
pub use components::{Component, InterpretParams, NeighborAux, Neighbors};
pub use config::{DemoConfig, InterpretationConfig, SegmentationConfig, load_config};
pub use error::{CallSite, ConfigError, DemoError, InterpretationError, Result};
pub use interpret::{Interface, Interpretation, InterpretationMethod, SlotScores};
pub use prediction::{Prediction, Predictor};
pub use registry::ComponentRegistry;
pub use value::{AudioClip, Table, Value};
