//! Protocol-specific addressing values.
//!
//! A [`Location`] is an ordered sequence of named segments whose values are
//! either concrete or the wildcard marker `*`. Each management protocol has
//! its own textual form:
//!
//! - [`TreePath`]: `/subsystem=datasources/data-source=*`
//! - [`ObjectName`]: `java.lang:type=GarbageCollector,name=*`
//! - [`PlatformPath`]: `/os=linux/file_store=*`
//!
//! Locations are immutable and compared structurally. The address algebra
//! (matching, ancestry, templating) lives in [`crate::resolver`].

mod object;
mod platform;
mod tree;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

pub use object::ObjectName;
pub use platform::{PlatformPath, PlatformResourceType};
pub use tree::TreePath;

/// Marker standing for "any concrete value" in a segment.
pub const WILDCARD: &str = "*";

/// Management protocol family a location (and a task) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Path-addressed management tree (`/key=value/...`).
    Tree,
    /// Object-name addressed registry (`domain:key=value,...`).
    Object,
    /// Host operating system metrics.
    Platform,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Tree, Protocol::Object, Protocol::Platform];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tree => "tree",
            Protocol::Object => "object",
            Protocol::Platform => "platform",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single location segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentValue {
    Concrete(String),
    Wildcard,
}

impl SegmentValue {
    pub fn parse(raw: &str) -> Self {
        if raw == WILDCARD {
            SegmentValue::Wildcard
        } else {
            SegmentValue::Concrete(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SegmentValue::Concrete(v) => v,
            SegmentValue::Wildcard => WILDCARD,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, SegmentValue::Wildcard)
    }

    /// Whether this value (acting as a query) accepts `other`.
    pub fn accepts(&self, other: &SegmentValue) -> bool {
        self.is_wildcard() || self == other
    }
}

/// A named segment: `name=value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub name: String,
    pub value: SegmentValue,
}

impl Segment {
    pub fn new(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            value: SegmentValue::parse(value),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.value.is_wildcard()
    }

    /// Same name, and this segment's value is a wildcard or equal to the other's.
    pub fn accepts(&self, other: &Segment) -> bool {
        self.name == other.name && self.value.accepts(&other.value)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value.as_str())
    }
}

/// Splits `name=value` at the first `=`.
pub(crate) fn split_pair<'a>(
    protocol: Protocol,
    input: &str,
    pair: &'a str,
) -> Result<(&'a str, &'a str), ResolutionError> {
    let malformed = |reason: String| ResolutionError::Malformed {
        protocol,
        input: input.to_string(),
        reason,
    };
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| malformed(format!("segment '{pair}' is not of the form name=value")))?;
    if name.is_empty() {
        return Err(malformed(format!("segment '{pair}' has an empty name")));
    }
    if value.is_empty() {
        return Err(malformed(format!("segment '{pair}' has an empty value")));
    }
    Ok((name, value))
}

/// Location value for any of the supported protocols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Tree(TreePath),
    Object(ObjectName),
    Platform(PlatformPath),
}

impl Location {
    /// Parse the textual form of a location for the given protocol.
    pub fn parse(protocol: Protocol, input: &str) -> Result<Self, ResolutionError> {
        Ok(match protocol {
            Protocol::Tree => Location::Tree(input.parse()?),
            Protocol::Object => Location::Object(input.parse()?),
            Protocol::Platform => Location::Platform(input.parse()?),
        })
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Location::Tree(_) => Protocol::Tree,
            Location::Object(_) => Protocol::Object,
            Location::Platform(_) => Protocol::Platform,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        match self {
            Location::Tree(p) => p.segments(),
            Location::Object(o) => o.keys(),
            Location::Platform(p) => p.segments(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Tree(p) => p.fmt(f),
            Location::Object(o) => o.fmt(f),
            Location::Platform(p) => p.fmt(f),
        }
    }
}

impl From<TreePath> for Location {
    fn from(p: TreePath) -> Self {
        Location::Tree(p)
    }
}

impl From<ObjectName> for Location {
    fn from(o: ObjectName) -> Self {
        Location::Object(o)
    }
}

impl From<PlatformPath> for Location {
    fn from(p: PlatformPath) -> Self {
        Location::Platform(p)
    }
}
