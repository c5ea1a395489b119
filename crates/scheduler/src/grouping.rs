//! Partitioning of due tasks into protocol-efficient batches.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;
use vigil_core::Task;

use crate::group::{GroupKey, TaskGroup};

/// Partition `tasks` into [`TaskGroup`]s keyed by (type, interval, kind).
///
/// Single pass. Tasks keep their input order inside a group and groups are
/// emitted in order of first appearance of their key.
pub fn group_tasks<'a, I>(tasks: I) -> Vec<TaskGroup>
where
    I: IntoIterator<Item = &'a Arc<Task>>,
{
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<TaskGroup> = Vec::new();

    for task in tasks {
        let key = GroupKey::of(task);
        match index.get(&key) {
            Some(&i) => {
                if let Err(e) = groups[i].add_task(Arc::clone(task)) {
                    warn!(error = %e, "Task rejected by its own group");
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(TaskGroup::new(Arc::clone(task)));
            }
        }
    }

    groups
}
