//! Offline address algebra over [`Location`] values.
//!
//! One [`LocationResolver`] implementation exists per protocol. All
//! operations are pure and in-memory; nothing here talks to an endpoint.
//! [`ProtocolResolver`] dispatches over the [`Location`] sum type so callers
//! that hold mixed locations need no protocol-specific code.

mod object;
mod platform;
mod tree;

use crate::error::ResolutionError;
use crate::location::{Location, Segment};

pub use object::ObjectNameResolver;
pub use platform::PlatformResolver;
pub use tree::TreePathResolver;

/// Uniform address algebra for one protocol's locations.
pub trait LocationResolver {
    type Location;

    /// Combine a base location with a (possibly relative) location.
    ///
    /// If either side is missing (or empty) the other is returned unchanged.
    fn absolutize(
        &self,
        base: Option<&Self::Location>,
        location: Option<&Self::Location>,
    ) -> Result<Option<Self::Location>, ResolutionError>;

    /// Whether the location contains at least one wildcard segment.
    fn is_multi_target(&self, location: &Self::Location) -> bool;

    /// Whether `concrete` is addressed by `query`: same shape, every query
    /// segment is a wildcard or equal to the concrete one.
    fn matches(&self, query: &Self::Location, concrete: &Self::Location) -> bool;

    /// Whether `child` strictly extends `parent`. Grandchildren qualify.
    fn is_parent(&self, parent: &Self::Location, child: &Self::Location) -> bool;

    /// Value that `single` binds to the one wildcard in `multi_target`.
    fn find_wildcard_match(
        &self,
        multi_target: Option<&Self::Location>,
        single: &Self::Location,
    ) -> Result<String, ResolutionError>;

    /// Expand the placeholders of a naming template against a location.
    fn apply_template(&self, template: &str, location: &Self::Location, endpoint_name: &str) -> String;
}

// ── Path helpers shared by positional protocols ─────────────────────

pub(crate) fn path_matches(query: &[Segment], concrete: &[Segment]) -> bool {
    query.len() == concrete.len() && query.iter().zip(concrete).all(|(q, c)| q.accepts(c))
}

pub(crate) fn path_is_parent(parent: &[Segment], child: &[Segment]) -> bool {
    parent.len() < child.len() && parent.iter().zip(child).all(|(p, c)| p.accepts(c))
}

/// Index of the single wildcard segment, or an error naming `display`.
pub(crate) fn single_wildcard(segments: &[Segment], display: &str) -> Result<usize, ResolutionError> {
    let mut found = None;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_wildcard() {
            if found.is_some() {
                return Err(ResolutionError::MultipleWildcards(display.to_string()));
            }
            found = Some(i);
        }
    }
    found.ok_or_else(|| ResolutionError::NoWildcard(display.to_string()))
}

pub(crate) fn path_wildcard_match(
    multi: &[Segment],
    multi_display: &str,
    single: &[Segment],
    single_display: &str,
) -> Result<String, ResolutionError> {
    let index = single_wildcard(multi, multi_display)?;
    let wanted = &multi[index].name;
    match single.get(index) {
        Some(segment) if &segment.name == wanted => Ok(segment.value.as_str().to_string()),
        _ => Err(ResolutionError::MissingSegment {
            location: single_display.to_string(),
            segment: wanted.clone(),
        }),
    }
}

/// Missing or empty sides yield the other side; otherwise `join` combines them.
pub(crate) fn absolutize_with<L: Clone>(
    base: Option<&L>,
    location: Option<&L>,
    is_empty: impl Fn(&L) -> bool,
    join: impl FnOnce(&L, &L) -> L,
) -> Option<L> {
    match (base, location) {
        (None, None) => None,
        (None, Some(l)) => Some(l.clone()),
        (Some(b), None) => Some(b.clone()),
        (Some(b), Some(l)) if is_empty(b) => Some(l.clone()),
        (Some(b), Some(l)) if is_empty(l) => Some(b.clone()),
        (Some(b), Some(l)) => Some(join(b, l)),
    }
}

/// Resolver over the [`Location`] sum type, forwarding to the variant's
/// protocol resolver.
///
/// Predicates over locations of different protocols are `false`;
/// operations that build or extract a value fail with
/// [`ResolutionError::ProtocolMismatch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolResolver;

impl ProtocolResolver {
    fn mismatch(left: &Location, right: &Location) -> ResolutionError {
        ResolutionError::ProtocolMismatch {
            left: left.protocol(),
            right: right.protocol(),
        }
    }
}

impl LocationResolver for ProtocolResolver {
    type Location = Location;

    fn absolutize(
        &self,
        base: Option<&Location>,
        location: Option<&Location>,
    ) -> Result<Option<Location>, ResolutionError> {
        match (base, location) {
            (Some(Location::Tree(b)), Some(Location::Tree(l))) => {
                Ok(TreePathResolver.absolutize(Some(b), Some(l))?.map(Location::Tree))
            }
            (Some(Location::Object(b)), Some(Location::Object(l))) => {
                Ok(ObjectNameResolver.absolutize(Some(b), Some(l))?.map(Location::Object))
            }
            (Some(Location::Platform(b)), Some(Location::Platform(l))) => {
                Ok(PlatformResolver.absolutize(Some(b), Some(l))?.map(Location::Platform))
            }
            (Some(b), Some(l)) => Err(Self::mismatch(b, l)),
            (None, l) => Ok(l.cloned()),
            (b, None) => Ok(b.cloned()),
        }
    }

    fn is_multi_target(&self, location: &Location) -> bool {
        match location {
            Location::Tree(l) => TreePathResolver.is_multi_target(l),
            Location::Object(l) => ObjectNameResolver.is_multi_target(l),
            Location::Platform(l) => PlatformResolver.is_multi_target(l),
        }
    }

    fn matches(&self, query: &Location, concrete: &Location) -> bool {
        match (query, concrete) {
            (Location::Tree(q), Location::Tree(c)) => TreePathResolver.matches(q, c),
            (Location::Object(q), Location::Object(c)) => ObjectNameResolver.matches(q, c),
            (Location::Platform(q), Location::Platform(c)) => PlatformResolver.matches(q, c),
            _ => false,
        }
    }

    fn is_parent(&self, parent: &Location, child: &Location) -> bool {
        match (parent, child) {
            (Location::Tree(p), Location::Tree(c)) => TreePathResolver.is_parent(p, c),
            (Location::Object(p), Location::Object(c)) => ObjectNameResolver.is_parent(p, c),
            (Location::Platform(p), Location::Platform(c)) => PlatformResolver.is_parent(p, c),
            _ => false,
        }
    }

    fn find_wildcard_match(
        &self,
        multi_target: Option<&Location>,
        single: &Location,
    ) -> Result<String, ResolutionError> {
        let multi = multi_target
            .ok_or_else(|| ResolutionError::MissingLocation("multi-target location is required".into()))?;
        match (multi, single) {
            (Location::Tree(m), Location::Tree(s)) => TreePathResolver.find_wildcard_match(Some(m), s),
            (Location::Object(m), Location::Object(s)) => ObjectNameResolver.find_wildcard_match(Some(m), s),
            (Location::Platform(m), Location::Platform(s)) => PlatformResolver.find_wildcard_match(Some(m), s),
            (m, s) => Err(Self::mismatch(m, s)),
        }
    }

    fn apply_template(&self, template: &str, location: &Location, endpoint_name: &str) -> String {
        match location {
            Location::Tree(l) => TreePathResolver.apply_template(template, l, endpoint_name),
            Location::Object(l) => ObjectNameResolver.apply_template(template, l, endpoint_name),
            Location::Platform(l) => PlatformResolver.apply_template(template, l, endpoint_name),
        }
    }
}
