//! Configuration types for framesight

use crate::error::{Error, Result};
use crate::tasks::{ParameterSet, TaskId, TaskRegistry};
use crate::types::{CameraFacing, Resolution};
use serde::{Deserialize, Serialize};

use std::path::Path;

/// Camera configuration forwarded to the capture collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Lens to open
    pub facing: CameraFacing,
    /// Requested sensor resolution
    pub resolution: Resolution,
    /// Resolutions the device offers; empty when unknown
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supported: Vec<Resolution>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Back,
            resolution: Resolution::HD_720P,
            supported: Vec::new(),
        }
    }
}

impl CameraSettings {
    pub fn with_facing(mut self, facing: CameraFacing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_supported(mut self, supported: Vec<Resolution>) -> Self {
        self.supported = supported;
        self
    }

    /// Normalize the supported list and replace an unsupported request with a fallback
    pub fn resolve(&mut self) {
        self.supported = Self::normalize_resolutions(&self.supported);
        self.resolution = self.validate_resolution(&self.supported);
    }

    /// Deduplicate and sort a device's resolution list by pixel area
    pub fn normalize_resolutions(resolutions: &[Resolution]) -> Vec<Resolution> {
        let mut list: Vec<Resolution> = resolutions
            .iter()
            .copied()
            .filter(|r| r.width > 0 && r.height > 0)
            .collect();
        list.sort_by_key(|r| (r.pixels(), r.width));
        list.dedup();
        list
    }

    /// Resolution to actually request from a device supporting `supported`
    ///
    /// Keeps the requested resolution when offered, otherwise falls back to the
    /// largest supported one. An empty list leaves the request untouched.
    pub fn validate_resolution(&self, supported: &[Resolution]) -> Resolution {
        let supported = Self::normalize_resolutions(supported);
        if supported.is_empty() || supported.contains(&self.resolution) {
            return self.resolution;
        }

        match supported.last() {
            Some(&largest) => {
                tracing::warn!(
                    requested = %self.resolution,
                    fallback = %largest,
                    "Requested resolution not supported"
                );
                largest
            }
            None => self.resolution,
        }
    }
}

/// Active task selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Task applied to every frame
    pub task: TaskId,
    /// Overrides on top of the task's declared defaults
    pub parameters: ParameterSet,
}

/// Top-level configuration, loadable from TOML
///
/// ```toml
/// [camera]
/// facing = "front"
/// resolution = { width = 640, height = 480 }
/// supported = [{ width = 640, height = 480 }, { width = 1280, height = 720 }]
///
/// [analysis]
/// task = "edge_detection"
/// parameters = { lowThreshold = 30.0, highThreshold = 90.0 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub camera: CameraSettings,
    pub analysis: AnalysisConfig,
}

impl AnalyzerConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_task(mut self, task: TaskId) -> Self {
        if self.analysis.task != task {
            self.analysis.parameters = ParameterSet::new();
        }
        self.analysis.task = task;
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.analysis.parameters = parameters;
        self
    }

    pub fn with_facing(mut self, facing: CameraFacing) -> Self {
        self.camera.facing = facing;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.camera.resolution = resolution;
        self
    }

    /// Check the task exists and every override matches its declaration
    ///
    /// Returns the full parameter set (defaults plus overrides).
    pub fn validate(&self, registry: &TaskRegistry) -> Result<ParameterSet> {
        let resolution = self.camera.resolution;
        if resolution.width == 0 || resolution.height == 0 {
            return Err(Error::Config(format!("Invalid resolution {}", resolution)));
        }
        let task = registry.get(self.analysis.task)?;
        task.descriptor().apply(&self.analysis.parameters)
    }
}
