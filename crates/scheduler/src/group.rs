use std::fmt;
use std::sync::Arc;

use vigil_core::{Interval, Kind, Task, TaskType};

use crate::error::GroupError;

/// Key shared by every task of one [`TaskGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub task_type: TaskType,
    pub interval: Interval,
    pub kind: Kind,
}

impl GroupKey {
    pub fn of(task: &Task) -> Self {
        Self {
            task_type: task.task_type(),
            interval: task.interval(),
            kind: task.kind().clone(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.task_type, self.interval, self.kind)
    }
}

/// Ordered batch of tasks sharing type, interval and kind.
///
/// A group is never heterogeneous: [`TaskGroup::add_task`] rejects any task
/// whose key differs from the group's.
#[derive(Debug, Clone)]
pub struct TaskGroup {
    key: GroupKey,
    tasks: Vec<Arc<Task>>,
}

impl TaskGroup {
    /// Start a group whose key is taken from its first task.
    pub fn new(first: Arc<Task>) -> Self {
        Self {
            key: GroupKey::of(&first),
            tasks: vec![first],
        }
    }

    pub fn add_task(&mut self, task: Arc<Task>) -> Result<(), GroupError> {
        if task.task_type() != self.key.task_type {
            return Err(GroupError::TypeMismatch {
                task: task.id().to_string(),
                expected: self.key.task_type,
                actual: task.task_type(),
            });
        }
        if task.interval() != self.key.interval {
            return Err(GroupError::IntervalMismatch {
                task: task.id().to_string(),
                expected: self.key.interval,
                actual: task.interval(),
            });
        }
        if task.kind() != &self.key.kind {
            return Err(GroupError::KindMismatch {
                task: task.id().to_string(),
                expected: self.key.kind.clone(),
                actual: task.kind().clone(),
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn task_type(&self) -> TaskType {
        self.key.task_type
    }

    pub fn interval(&self) -> Interval {
        self.key.interval
    }

    pub fn kind(&self) -> &Kind {
        &self.key.kind
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Task>> {
        self.tasks.get(index)
    }

    pub fn tasks(&self) -> &[Arc<Task>] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Task>> {
        self.tasks.iter()
    }
}

impl<'a> IntoIterator for &'a TaskGroup {
    type Item = &'a Arc<Task>;
    type IntoIter = std::slice::Iter<'a, Arc<Task>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
