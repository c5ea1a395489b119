use thiserror::Error;

use crate::location::Protocol;

/// Errors raised by location parsing and the address algebra in
/// [`crate::resolver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Missing location: {0}")]
    MissingLocation(String),

    #[error("Location [{0}] has no wildcard segment")]
    NoWildcard(String),

    #[error("Location [{0}] has more than one wildcard segment")]
    MultipleWildcards(String),

    #[error("Location [{location}] has no segment [{segment}]")]
    MissingSegment { location: String, segment: String },

    #[error("Malformed {protocol} location [{input}]: {reason}")]
    Malformed {
        protocol: Protocol,
        input: String,
        reason: String,
    },

    #[error("Cannot combine {left} location with {right} location")]
    ProtocolMismatch { left: Protocol, right: Protocol },
}

/// Errors raised while constructing a [`crate::Task`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task [{id}] targets a {location} location but its kind uses {kind}")]
    ProtocolMismatch {
        id: String,
        location: Protocol,
        kind: Protocol,
    },

    #[error("Task [{0}] sets an up-regex but is not an availability task")]
    UpRegexOnMetric(String),

    #[error("Task [{id}] has an invalid up-regex: {reason}")]
    InvalidUpRegex { id: String, reason: String },

    #[error("Task [{0}] has a zero collection interval")]
    ZeroInterval(String),

    #[error("Task id must not be empty")]
    EmptyId,
}
