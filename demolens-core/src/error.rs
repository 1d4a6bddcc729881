//! Error types for demolens core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering component configuration, unsupported conversions, value shape
//! problems and interpretation failures.

use std::fmt;

/// Top-level error type for the demolens core library.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Interpretation error: {0}")]
    Interpretation(#[from] InterpretationError),

    #[error("Unsupported operation for component '{component}': {operation}")]
    Unsupported { component: String, operation: String },

    #[error("Invalid value for component '{component}': {message}")]
    InvalidValue { component: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Audio codec error: {0}")]
    Audio(#[from] hound::Error),
}

impl DemoError {
    pub fn unsupported(component: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            component: component.into(),
            operation: operation.into(),
        }
    }

    pub fn invalid_value(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while building or resolving components.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Component type already registered: {name}")]
    DuplicateComponent { name: String },

    #[error("Unknown component type: {name}")]
    UnknownComponent { name: String },

    #[error("Invalid type '{variant}' for component '{component}', expected one of: {expected}")]
    InvalidType {
        component: String,
        variant: String,
        expected: String,
    },

    #[error("Invalid parameter '{parameter}' for component '{component}': {reason}")]
    InvalidParameter {
        component: String,
        parameter: String,
        reason: String,
    },
}

/// Where in an interpretation run the wrapped function was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSite {
    Baseline,
    Neighbor { slot: usize, index: usize },
    Coalition { slot: usize },
    Custom,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Neighbor { slot, index } => write!(f, "neighbor {index} of slot {slot}"),
            Self::Coalition { slot } => write!(f, "coalition of slot {slot}"),
            Self::Custom => write!(f, "custom interpreter"),
        }
    }
}

/// Errors from running the interpretation engine.
#[derive(Debug, thiserror::Error)]
pub enum InterpretationError {
    #[error("Prediction failed at {site}: {message}")]
    Prediction { site: CallSite, message: String },

    #[error("Component '{component}' does not support {method} interpretation")]
    UnsupportedMethod { component: String, method: String },

    #[error("Expected {expected} input values, got {got}")]
    ArityMismatch { expected: usize, got: usize },
}

impl InterpretationError {
    /// Wrap a failure of the user's function, keeping the full error chain in the message.
    pub fn prediction(site: CallSite, err: &anyhow::Error) -> Self {
        Self::Prediction {
            site,
            message: format!("{err:#}"),
        }
    }
}

/// Convenience result alias for demolens core.
pub type Result<T, E = DemoError> = std::result::Result<T, E>;
