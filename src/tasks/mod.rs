//! Image processing tasks
//!
//! Every task is a stateless transform over a packed RGBA/BGRA buffer plus a
//! static descriptor listing its tunable parameters. Exactly one task is
//! active in the analyzer at a time; tasks are looked up through the
//! [`TaskRegistry`] by their stable [`TaskId`].

mod edge;
mod grayscale;
pub mod params;
mod registry;

pub use edge::EdgeDetectionTask;
pub use grayscale::GrayscaleTask;
pub use params::{ParamValue, ParameterKind, ParameterSet, TaskParameter, ValueRange};
pub use registry::{TaskRegistry, TaskRegistryBuilder};

use crate::error::{Error, Result};
use crate::types::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Stable identifier of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    /// Single-channel luma re-expanded to RGBA
    Grayscale,
    /// Gaussian smoothing + hysteresis edge detector
    EdgeDetection,
}

impl TaskId {
    pub const ALL: [TaskId; 2] = [TaskId::Grayscale, TaskId::EdgeDetection];

    /// Identifier used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Grayscale => "grayscale",
            TaskId::EdgeDetection => "edge_detection",
        }
    }
}

impl Default for TaskId {
    fn default() -> Self {
        TaskId::EdgeDetection
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::UnknownTask(s.to_string()))
    }
}

/// Static description of a task, as shown in selection UIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDescriptor {
    pub id: TaskId,
    pub name: &'static str,
    pub description: &'static str,
    /// Ordered as presented to the user
    pub parameters: Vec<TaskParameter>,
}

impl TaskDescriptor {
    pub fn parameter(&self, key: &str) -> Option<&TaskParameter> {
        self.parameters.iter().find(|p| p.key == key)
    }

    /// Every declared parameter at its default value
    pub fn defaults(&self) -> ParameterSet {
        ParameterSet::from_defaults(&self.parameters)
    }

    /// Defaults overlaid with `overrides`, each value checked against its declaration
    pub fn apply(&self, overrides: &ParameterSet) -> Result<ParameterSet> {
        let mut params = self.defaults();
        for (key, value) in overrides.iter() {
            let param = self.parameter(key).ok_or_else(|| Error::UnknownParameter {
                task: self.id.to_string(),
                key: key.to_string(),
            })?;
            params.insert(key, param.coerce(value)?);
        }
        Ok(params)
    }
}

/// Trait for frame transforms
pub trait ProcessingTask: Send + Sync {
    /// Name, description and parameters
    fn descriptor(&self) -> &TaskDescriptor;

    /// Transform `input` into a new buffer
    ///
    /// Missing keys use the declared defaults and unknown keys are ignored.
    fn process(&self, input: &PixelBuffer, params: &ParameterSet) -> Result<PixelBuffer>;

    fn id(&self) -> TaskId {
        self.descriptor().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_round_trip_names() {
        for id in TaskId::ALL {
            assert_eq!(id.as_str().parse::<TaskId>().unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_task_name() {
        let err = "Edge Detection".parse::<TaskId>().unwrap_err();
        assert!(matches!(err, Error::UnknownTask(_)));
    }

    #[test]
    fn test_default_task() {
        assert_eq!(TaskId::default(), TaskId::EdgeDetection);
    }

    #[test]
    fn test_apply_overrides() {
        let descriptor = EdgeDetectionTask::new().descriptor().clone();
        let params = descriptor
            .apply(&ParameterSet::new().with("lowThreshold", ParamValue::Int(20)))
            .unwrap();
        assert_eq!(params.get("lowThreshold"), Some(&ParamValue::Float(20.0)));
        assert_eq!(params.get("highThreshold"), Some(&ParamValue::Float(150.0)));

        let unknown = descriptor.apply(&ParameterSet::new().with("sigma", ParamValue::Float(1.0)));
        assert!(matches!(unknown, Err(Error::UnknownParameter { .. })));
        let invalid =
            descriptor.apply(&ParameterSet::new().with("highThreshold", ParamValue::Float(300.0)));
        assert!(matches!(invalid, Err(Error::InvalidParameter { .. })));
    }
}
