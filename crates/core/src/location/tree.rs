use std::fmt;
use std::str::FromStr;

use crate::error::ResolutionError;

use super::{split_pair, Protocol, Segment};

/// Address in a path-addressed management tree, e.g.
/// `/subsystem=datasources/data-source=ExampleDS`.
///
/// The empty path (`/`) addresses the root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment, returning the extended path.
    pub fn child(mut self, name: &str, value: &str) -> Self {
        self.segments.push(Segment::new(name, value));
        self
    }
}

impl FromStr for TreePath {
    type Err = ResolutionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(Self::root());
        }
        let body = trimmed.strip_prefix('/').ok_or_else(|| ResolutionError::Malformed {
            protocol: Protocol::Tree,
            input: input.to_string(),
            reason: "path must start with '/'".to_string(),
        })?;
        let segments = body
            .split('/')
            .map(|pair| split_pair(Protocol::Tree, input, pair).map(|(n, v)| Segment::new(n, v)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
