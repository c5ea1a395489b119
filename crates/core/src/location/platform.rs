use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

use super::{split_pair, Protocol, Segment};

/// Resource types exposed by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformResourceType {
    #[serde(rename = "os")]
    OperatingSystem,
    FileStore,
    Memory,
    Processor,
    PowerSource,
}

impl PlatformResourceType {
    /// Segment name used in the textual path.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformResourceType::OperatingSystem => "os",
            PlatformResourceType::FileStore => "file_store",
            PlatformResourceType::Memory => "memory",
            PlatformResourceType::Processor => "processor",
            PlatformResourceType::PowerSource => "power_source",
        }
    }

    /// Human readable resource type name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformResourceType::OperatingSystem => "Operating System",
            PlatformResourceType::FileStore => "File Store",
            PlatformResourceType::Memory => "Memory",
            PlatformResourceType::Processor => "Processor",
            PlatformResourceType::PowerSource => "Power Source",
        }
    }
}

impl FromStr for PlatformResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "os" => Ok(PlatformResourceType::OperatingSystem),
            "file_store" => Ok(PlatformResourceType::FileStore),
            "memory" => Ok(PlatformResourceType::Memory),
            "processor" => Ok(PlatformResourceType::Processor),
            "power_source" => Ok(PlatformResourceType::PowerSource),
            other => Err(format!("unknown platform resource type '{other}'")),
        }
    }
}

impl fmt::Display for PlatformResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of `(resource type, name)` segments on the host platform, e.g.
/// `/os=linux/file_store=*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PlatformPath {
    segments: Vec<Segment>,
}

impl PlatformPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a segment of the given type.
    pub fn segment(mut self, kind: PlatformResourceType, name: &str) -> Self {
        self.segments.push(Segment::new(kind.as_str(), name));
        self
    }

    /// Append a wildcard segment of the given type.
    pub fn any(self, kind: PlatformResourceType) -> Self {
        self.segment(kind, super::WILDCARD)
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

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Resource type of the last segment.
    pub fn leaf_type(&self) -> Option<PlatformResourceType> {
        self.last().and_then(|s| s.name.parse().ok())
    }

    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl FromStr for PlatformPath {
    type Err = ResolutionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| ResolutionError::Malformed {
            protocol: Protocol::Platform,
            input: input.to_string(),
            reason,
        };
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(Self::empty());
        }
        let body = trimmed
            .strip_prefix('/')
            .ok_or_else(|| malformed("path must start with '/'".to_string()))?;
        let mut path = Self::empty();
        for pair in body.split('/') {
            let (kind, name) = split_pair(Protocol::Platform, input, pair)?;
            let kind: PlatformResourceType = kind.parse().map_err(malformed)?;
            path = path.segment(kind, name);
        }
        Ok(path)
    }
}

impl fmt::Display for PlatformPath {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_parse_agree() {
        let built = PlatformPath::empty()
            .segment(PlatformResourceType::OperatingSystem, "linux")
            .any(PlatformResourceType::FileStore);
        let parsed: PlatformPath = "/os=linux/file_store=*".parse().unwrap();
        assert_eq!(built, parsed);
        assert_eq!(parsed.leaf_type(), Some(PlatformResourceType::FileStore));
        assert!(parsed.last().unwrap().is_wildcard());
    }

    #[test]
    fn rejects_unknown_resource_type() {
        let err = "/os=linux/gpu=0".parse::<PlatformPath>().unwrap_err();
        assert!(err.to_string().contains("gpu"));
    }
}
