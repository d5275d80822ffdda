//! Task catalogue

use super::{
    EdgeDetectionTask, GrayscaleTask, ParameterSet, ProcessingTask, TaskDescriptor, TaskId,
};
use crate::error::{Error, Result};

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Built-in catalogue, created on first use
static BUILTIN: OnceLock<Arc<TaskRegistry>> = OnceLock::new();

/// Read-only mapping from [`TaskId`] to a task implementation
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, Arc<dyn ProcessingTask>>,
}

impl TaskRegistry {
    /// Process-wide catalogue with every built-in task
    pub fn builtin() -> Arc<TaskRegistry> {
        BUILTIN
            .get_or_init(|| {
                let registry = TaskRegistry::builder()
                    .register(EdgeDetectionTask::new())
                    .register(GrayscaleTask::new())
                    .build();
                tracing::debug!(tasks = registry.tasks.len(), "Task registry initialized");
                Arc::new(registry)
            })
            .clone()
    }

    pub fn builder() -> TaskRegistryBuilder {
        TaskRegistryBuilder::default()
    }

    pub fn get(&self, id: TaskId) -> Result<Arc<dyn ProcessingTask>> {
        self.tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::UnknownTask(id.to_string()))
    }

    /// Resolve a textual identifier
    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn ProcessingTask>> {
        self.get(name.parse()?)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Descriptors for populating selection UIs
    pub fn list_tasks(&self) -> Vec<TaskDescriptor> {
        self.tasks.values().map(|t| t.descriptor().clone()).collect()
    }

    /// Default parameter values for a task
    pub fn defaults(&self, id: TaskId) -> Result<ParameterSet> {
        Ok(self.get(id)?.descriptor().defaults())
    }
}

/// Collects task implementations before freezing them into a registry
#[derive(Default)]
pub struct TaskRegistryBuilder {
    tasks: BTreeMap<TaskId, Arc<dyn ProcessingTask>>,
}

impl TaskRegistryBuilder {
    /// Add a task under its descriptor id, replacing any earlier entry
    pub fn register<T: ProcessingTask + 'static>(mut self, task: T) -> Self {
        self.tasks.insert(task.id(), Arc::new(task));
        self
    }

    pub fn build(self) -> TaskRegistry {
        TaskRegistry { tasks: self.tasks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::ParamValue;

    #[test]
    fn test_builtin_contains_all_tasks() {
        let registry = TaskRegistry::builtin();
        for id in TaskId::ALL {
            assert!(registry.contains(id));
            assert_eq!(registry.get(id).unwrap().id(), id);
        }
        assert!(Arc::ptr_eq(&registry, &TaskRegistry::builtin()));
    }

    #[test]
    fn test_list_tasks() {
        let tasks = TaskRegistry::builtin().list_tasks();
        assert_eq!(tasks.len(), 2);
        let edge = tasks
            .iter()
            .find(|t| t.id == TaskId::EdgeDetection)
            .unwrap();
        let keys: Vec<_> = edge.parameters.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["lowThreshold", "highThreshold"]);
    }

    #[test]
    fn test_defaults() {
        let registry = TaskRegistry::builtin();
        let edge = registry.defaults(TaskId::EdgeDetection).unwrap();
        assert_eq!(edge.get("lowThreshold"), Some(&ParamValue::Float(50.0)));
        assert_eq!(edge.get("highThreshold"), Some(&ParamValue::Float(150.0)));
        assert!(registry.defaults(TaskId::Grayscale).unwrap().is_empty());
    }

    #[test]
    fn test_missing_task_is_error() {
        let registry = TaskRegistry::builder().register(GrayscaleTask::new()).build();
        assert!(matches!(
            registry.get(TaskId::EdgeDetection),
            Err(Error::UnknownTask(_))
        ));
        assert!(registry.get_by_name("sharpen").is_err());
    }

    #[test]
    fn test_descriptor_serializes() {
        let json = serde_json::to_value(TaskRegistry::builtin().list_tasks()).unwrap();
        assert_eq!(json[0]["id"], "grayscale");
        assert_eq!(json[1]["parameters"][0]["range"]["max"], 255.0);
    }
}
