//! Simulation configuration loaded from TOML.
//!
//! Every field has a default, so a partial file (or none at all) is valid:
//!
//! ```toml
//! seed = 7
//!
//! [objects]
//! min = 4
//! max = 12
//!
//! [anomaly]
//! fuzziness = 0.25
//!
//! [[parameters]]
//! label = "cube"
//! channel = "x_rotation"
//! std = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::channel::{Channel, ParamSlot};
use crate::params::{ParameterBank, ParameterError, ParameterSet};
use crate::sampler::{DepthMapping, SamplingContext};
use crate::shape::{ParamLabel, ShapeWeights};

/// Error type for configuration loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    Parse(toml::de::Error),
    /// A value is out of its allowed range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<ParameterError> for ConfigError {
    fn from(err: ParameterError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsConfig {
    #[serde(default = "ObjectsConfig::default_min")]
    pub min: u32,
    #[serde(default = "ObjectsConfig::default_max")]
    pub max: u32,
}

impl ObjectsConfig {
    fn default_min() -> u32 {
        1
    }
    fn default_max() -> u32 {
        1
    }
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            min: Self::default_min(),
            max: Self::default_max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "AnomalyConfig::default_fuzziness")]
    pub fuzziness: f64,
    #[serde(default = "AnomalyConfig::default_p_threshold")]
    pub p_threshold: f64,
}

impl AnomalyConfig {
    fn default_fuzziness() -> f64 {
        0.5
    }
    fn default_p_threshold() -> f64 {
        0.01
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            fuzziness: Self::default_fuzziness(),
            p_threshold: Self::default_p_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "SceneConfig::default_scene_depth")]
    pub scene_depth: f64,
    #[serde(default = "SceneConfig::default_z_close_boundary")]
    pub z_close_boundary: f64,
    #[serde(default = "SceneConfig::default_time_scale")]
    pub time_scale: f64,
}

impl SceneConfig {
    fn default_scene_depth() -> f64 {
        25.0
    }
    fn default_z_close_boundary() -> f64 {
        5.0
    }
    fn default_time_scale() -> f64 {
        1.0
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            scene_depth: Self::default_scene_depth(),
            z_close_boundary: Self::default_z_close_boundary(),
            time_scale: Self::default_time_scale(),
        }
    }
}

/// One parameter edit applied on top of the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverride {
    pub label: ParamLabel,
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<bool>,
}

impl ParameterOverride {
    /// Writes the present fields into `set`.
    pub fn apply_to(&self, set: &mut ParameterSet) -> Result<(), ParameterError> {
        if let Some(mean) = self.mean {
            set.set_value(ParamSlot::mean(self.channel), mean)?;
        }
        if let Some(std) = self.std {
            set.set_value(ParamSlot::std(self.channel), std)?;
        }
        if let Some(include) = self.include {
            set.set_included(self.channel, include);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed of the transform and object-count streams.
    #[serde(default)]
    pub seed: u64,
    /// Seed of the cosmetic stream.
    #[serde(default)]
    pub cosmetic_seed: u64,
    /// Spawn weight per shape, in [`Shape::ALL`](crate::shape::Shape::ALL) order.
    #[serde(default)]
    pub shape_weights: ShapeWeights,
    #[serde(default)]
    pub objects: ObjectsConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOverride>,
}

impl SimulationConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like [`load`](Self::load), falling back to defaults on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("config {} not found; using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("{err}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks every range constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fuzziness = self.anomaly.fuzziness;
        if !(0.0..=1.0).contains(&fuzziness) {
            return Err(ConfigError::Invalid(format!(
                "fuzziness must be in [0, 1], got {fuzziness}"
            )));
        }
        let p = self.anomaly.p_threshold;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Invalid(format!(
                "p_threshold must be in [0, 1], got {p}"
            )));
        }
        for (i, &w) in self.shape_weights.as_array().iter().enumerate() {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "shape weight {i} must be finite and non-negative, got {w}"
                )));
            }
        }
        let total = self.shape_weights.total();
        if !total.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "shape weights must have a finite sum, got {total}"
            )));
        }
        let time_scale = self.scene.time_scale;
        if !(time_scale.is_finite() && time_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "time_scale must be positive, got {time_scale}"
            )));
        }
        let depth = self.scene.scene_depth;
        if !(depth.is_finite() && depth >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scene_depth must be non-negative, got {depth}"
            )));
        }
        if !self.scene.z_close_boundary.is_finite() {
            return Err(ConfigError::Invalid(
                "z_close_boundary must be finite".to_string(),
            ));
        }
        let mut scratch = ParameterSet::with_defaults(ParamLabel::Global);
        for ov in &self.parameters {
            ov.apply_to(&mut scratch)?;
        }
        Ok(())
    }

    pub fn sampling_context(&self) -> SamplingContext {
        SamplingContext {
            fuzziness: self.anomaly.fuzziness,
            p_threshold: self.anomaly.p_threshold,
            depth: DepthMapping {
                scene_depth: self.scene.scene_depth,
                z_close_boundary: self.scene.z_close_boundary,
            },
        }
    }

    /// Writes every override into the bank's pending buffers, in file order.
    pub fn apply_overrides(&self, bank: &mut ParameterBank) -> Result<(), ParameterError> {
        for ov in &self.parameters {
            ov.apply_to(bank.pending_mut(ov.label))?;
        }
        Ok(())
    }
}
