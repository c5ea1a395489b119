use std::sync::LazyLock;

use regex::Regex;

use crate::error::ResolutionError;
use crate::location::TreePath;

use super::{absolutize_with, path_is_parent, path_matches, path_wildcard_match, LocationResolver};

/// `N` (1-based position), `-` (last item) or `ManagedServerName`, right
/// after a `%`.
static POSITIONAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+|-|ManagedServerName)").unwrap());

/// Resolver for path-addressed management trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreePathResolver;

impl LocationResolver for TreePathResolver {
    type Location = TreePath;

    fn absolutize(
        &self,
        base: Option<&TreePath>,
        location: Option<&TreePath>,
    ) -> Result<Option<TreePath>, ResolutionError> {
        Ok(absolutize_with(base, location, TreePath::is_empty, |b, l| {
            TreePath::new(b.segments().iter().chain(l.segments()).cloned().collect())
        }))
    }

    fn is_multi_target(&self, location: &TreePath) -> bool {
        location.segments().iter().any(|s| s.is_wildcard())
    }

    fn matches(&self, query: &TreePath, concrete: &TreePath) -> bool {
        path_matches(query.segments(), concrete.segments())
    }

    fn is_parent(&self, parent: &TreePath, child: &TreePath) -> bool {
        path_is_parent(parent.segments(), child.segments())
    }

    fn find_wildcard_match(
        &self,
        multi_target: Option<&TreePath>,
        single: &TreePath,
    ) -> Result<String, ResolutionError> {
        let multi = multi_target
            .ok_or_else(|| ResolutionError::MissingLocation("multi-target tree path is required".into()))?;
        path_wildcard_match(
            multi.segments(),
            &multi.to_string(),
            single.segments(),
            &single.to_string(),
        )
    }

    /// Supports `%key%` (value of segment `key`), `%N` (N-th item of the
    /// flattened `[key1, value1, key2, value2, ...]` list), `%-` (last item)
    /// and `%ManagedServerName`. Unresolvable placeholders stay as written.
    ///
    /// The template is scanned once, so substituted values are never
    /// expanded again.
    fn apply_template(&self, template: &str, location: &TreePath, endpoint_name: &str) -> String {
        let items: Vec<&str> = location
            .segments()
            .iter()
            .flat_map(|s| [s.name.as_str(), s.value.as_str()])
            .collect();

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some((consumed, value)) = named_token(after, location) {
                out.push_str(value);
                rest = &after[consumed..];
                continue;
            }

            let positional = POSITIONAL_TOKEN.find(after).and_then(|token| {
                let resolved = match token.as_str() {
                    "ManagedServerName" => Some(endpoint_name),
                    "-" => items.last().copied(),
                    digits => digits
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| items.get(i).copied()),
                };
                resolved.map(|value| (token.end(), value))
            });
            match positional {
                Some((consumed, value)) => {
                    out.push_str(value);
                    rest = &after[consumed..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// `key%` at the start of `input` for the longest matching segment name.
/// Returns the consumed length and the segment value.
fn named_token<'a>(input: &str, location: &'a TreePath) -> Option<(usize, &'a str)> {
    location
        .segments()
        .iter()
        .filter(|s| {
            input
                .strip_prefix(s.name.as_str())
                .is_some_and(|tail| tail.starts_with('%'))
        })
        .max_by_key(|s| s.name.len())
        .map(|s| (s.name.len() + 1, s.value.as_str()))
}
