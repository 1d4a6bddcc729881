//! Configuration system for demolens.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from the user config directory and/or `.demolens/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub interpretation: InterpretationConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub flagging: FlaggingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Interpretation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationConfig {
    /// Largest unit count for which Shapley values are computed by exact subset enumeration.
    #[serde(default = "default_exact_max_units")]
    pub shapley_exact_max_units: usize,
    /// Permutations sampled per unit when the unit count exceeds the exact threshold.
    #[serde(default = "default_samples_per_unit")]
    pub shapley_samples_per_unit: f64,
    /// Seed for permutation sampling.
    #[serde(default)]
    pub seed: u64,
}

impl Default for InterpretationConfig {
    fn default() -> Self {
        Self {
            shapley_exact_max_units: default_exact_max_units(),
            shapley_samples_per_unit: default_samples_per_unit(),
            seed: 0,
        }
    }
}

fn default_exact_max_units() -> usize {
    12
}

fn default_samples_per_unit() -> f64 {
    2.0
}

/// Superpixel segmentation settings used by image interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Approximate number of superpixels.
    #[serde(default = "default_n_segments")]
    pub n_segments: usize,
    /// Balance between color proximity and spatial proximity.
    #[serde(default = "default_compactness")]
    pub compactness: f64,
    /// Width of the Gaussian pre-smoothing kernel (0 disables smoothing).
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            n_segments: default_n_segments(),
            compactness: default_compactness(),
            sigma: default_sigma(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_n_segments() -> usize {
    20
}

fn default_compactness() -> f64 {
    10.0
}

fn default_sigma() -> f64 {
    1.0
}

fn default_max_iterations() -> usize {
    10
}

/// Flagging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggingConfig {
    /// Directory flagged values are written under.
    #[serde(default = "default_flagging_dir")]
    pub dir: PathBuf,
}

impl Default for FlaggingConfig {
    fn default() -> Self {
        Self {
            dir: default_flagging_dir(),
        }
    }
}

fn default_flagging_dir() -> PathBuf {
    PathBuf::from("flagged")
}

/// Logging settings consumed by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for JSON log files; file logging is off when unset.
    #[serde(default)]
    pub file_dir: Option<PathBuf>,
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `DEMOLENS_`)
/// 3. Workspace-local config (`.demolens/config.toml`)
/// 4. User config (`<config dir>/demolens/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&DemoConfig>,
) -> Result<DemoConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(DemoConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".demolens").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // DEMOLENS_INTERPRETATION__SEED, DEMOLENS_SEGMENTATION__N_SEGMENTS, etc.
    figment = figment.merge(Env::prefixed("DEMOLENS_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Path of the user-level config file, if a home directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "demolens", "demolens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
