use crate::error::ResolutionError;
use crate::location::{ObjectName, WILDCARD};

use super::{single_wildcard, LocationResolver};

/// Resolver for object-name addressed registries.
///
/// Object names carry no relative addressing: `absolutize` returns the
/// location itself whenever one is given. Key properties are compared by
/// name, not by position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectNameResolver;

impl ObjectNameResolver {
    fn domain_accepts(query: &ObjectName, concrete: &ObjectName) -> bool {
        query.domain() == WILDCARD || query.domain() == concrete.domain()
    }

    /// Every key of `query` exists in `concrete` and accepts its value.
    fn keys_accept(query: &ObjectName, concrete: &ObjectName) -> bool {
        query
            .keys()
            .iter()
            .all(|q| concrete.key(&q.name).is_some_and(|c| q.accepts(c)))
    }
}

impl LocationResolver for ObjectNameResolver {
    type Location = ObjectName;

    fn absolutize(
        &self,
        base: Option<&ObjectName>,
        location: Option<&ObjectName>,
    ) -> Result<Option<ObjectName>, ResolutionError> {
        Ok(location.or(base).cloned())
    }

    /// A `*` domain counts as a wildcard, like a `*` key value.
    fn is_multi_target(&self, location: &ObjectName) -> bool {
        location.domain() == WILDCARD || location.keys().iter().any(|k| k.is_wildcard())
    }

    fn matches(&self, query: &ObjectName, concrete: &ObjectName) -> bool {
        Self::domain_accepts(query, concrete)
            && query.keys().len() == concrete.keys().len()
            && Self::keys_accept(query, concrete)
    }

    fn is_parent(&self, parent: &ObjectName, child: &ObjectName) -> bool {
        Self::domain_accepts(parent, child)
            && parent.keys().len() < child.keys().len()
            && Self::keys_accept(parent, child)
    }

    fn find_wildcard_match(
        &self,
        multi_target: Option<&ObjectName>,
        single: &ObjectName,
    ) -> Result<String, ResolutionError> {
        let multi = multi_target
            .ok_or_else(|| ResolutionError::MissingLocation("multi-target object name is required".into()))?;
        let index = single_wildcard(multi.keys(), &multi.to_string())?;
        let wanted = &multi.keys()[index].name;
        single
            .key(wanted)
            .map(|k| k.value.as_str().to_string())
            .ok_or_else(|| ResolutionError::MissingSegment {
                location: single.to_string(),
                segment: wanted.clone(),
            })
    }

    /// Supports `%key%` for every key property and `%_ManagedServerName%`.
    fn apply_template(&self, template: &str, location: &ObjectName, endpoint_name: &str) -> String {
        let mut out = template.replace("%_ManagedServerName%", endpoint_name);
        for key in location.keys() {
            out = out.replace(&format!("%{}%", key.name), key.value.as_str());
        }
        out
    }
}
