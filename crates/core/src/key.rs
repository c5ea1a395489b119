//! Deterministic storage keys.
//!
//! A key is `endpoint|location[|attribute][#subref]`. Backslash, `|` and `#`
//! are backslash-escaped inside every component, so two distinct
//! (endpoint, location, attribute, subref) tuples never share a key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(endpoint: &str, location: &str, attribute: Option<&str>, subref: Option<&str>) -> Self {
        let mut key = String::with_capacity(endpoint.len() + location.len() + 16);
        push_escaped(&mut key, endpoint);
        key.push('|');
        push_escaped(&mut key, location);
        if let Some(attribute) = attribute {
            key.push('|');
            push_escaped(&mut key, attribute);
        }
        if let Some(subref) = subref {
            key.push('#');
            push_escaped(&mut key, subref);
        }
        Self(key)
    }

    pub fn for_task(task: &Task) -> Self {
        Self::new(
            &task.kind().endpoint,
            &task.location().to_string(),
            task.attribute(),
            task.subref(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn push_escaped(out: &mut String, part: &str) {
    for c in part.chars() {
        if matches!(c, '\\' | '|' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
