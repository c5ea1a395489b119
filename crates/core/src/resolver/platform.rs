use crate::error::ResolutionError;
use crate::location::PlatformPath;

use super::{absolutize_with, path_is_parent, path_matches, path_wildcard_match, LocationResolver};

/// Resolver for host platform paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformResolver;

impl LocationResolver for PlatformResolver {
    type Location = PlatformPath;

    fn absolutize(
        &self,
        base: Option<&PlatformPath>,
        location: Option<&PlatformPath>,
    ) -> Result<Option<PlatformPath>, ResolutionError> {
        Ok(absolutize_with(base, location, PlatformPath::is_empty, |b, l| {
            PlatformPath::from_segments(b.segments().iter().chain(l.segments()).cloned().collect())
        }))
    }

    fn is_multi_target(&self, location: &PlatformPath) -> bool {
        location.segments().iter().any(|s| s.is_wildcard())
    }

    fn matches(&self, query: &PlatformPath, concrete: &PlatformPath) -> bool {
        path_matches(query.segments(), concrete.segments())
    }

    fn is_parent(&self, parent: &PlatformPath, child: &PlatformPath) -> bool {
        path_is_parent(parent.segments(), child.segments())
    }

    fn find_wildcard_match(
        &self,
        multi_target: Option<&PlatformPath>,
        single: &PlatformPath,
    ) -> Result<String, ResolutionError> {
        let multi = multi_target
            .ok_or_else(|| ResolutionError::MissingLocation("multi-target platform path is required".into()))?;
        path_wildcard_match(
            multi.segments(),
            &multi.to_string(),
            single.segments(),
            &single.to_string(),
        )
    }

    /// `%s` expands to the name of the last segment, `%type%` (for example
    /// `%file_store%`) to the name of that segment.
    fn apply_template(&self, template: &str, location: &PlatformPath, endpoint_name: &str) -> String {
        let mut out = template.replace("%_ManagedServerName%", endpoint_name);
        for segment in location.segments() {
            out = out.replace(&format!("%{}%", segment.name), segment.value.as_str());
        }
        match location.last() {
            Some(last) => out.replace("%s", last.value.as_str()),
            None => out,
        }
    }
}
