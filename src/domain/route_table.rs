//! Route classification: resolves an inbound path to a rule and an access level.

use anyhow::{Result, bail};
use std::collections::HashMap;

use super::route_rule::{PathPattern, RouteRule};

/// Whether a request on a route must carry a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// Outcome of classifying a path.
#[derive(Debug, Clone, Copy)]
pub struct Route<'a> {
    pub rule: &'a RouteRule,
    pub access: Access,
}

impl Route<'_> {
    pub fn is_public(&self) -> bool {
        self.access == Access::Public
    }
}

/// Read-only table of route rules and public path patterns.
///
/// Rules are kept sorted by descending prefix length, so the first match is the
/// longest one. Duplicate prefixes are rejected, which makes the match unique.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    public_paths: Vec<PathPattern>,
}

impl RouteTable {
    /// # Errors
    ///
    /// Returns an error if two rules share the same prefix or a prefix does not
    /// start with `/`.
    pub fn new(mut rules: Vec<RouteRule>, public_paths: Vec<PathPattern>) -> Result<Self> {
        let mut seen: HashMap<&str, &str> = HashMap::with_capacity(rules.len());
        for rule in &rules {
            if !rule.prefix.starts_with('/') {
                bail!("route '{}': prefix must start with '/'", rule.name);
            }
            if let Some(other) = seen.insert(normalized(&rule.prefix), &rule.name) {
                bail!(
                    "routes '{}' and '{}' share prefix '{}'",
                    other,
                    rule.name,
                    rule.prefix
                );
            }
        }
        drop(seen);

        rules.sort_by(|a, b| normalized(&b.prefix).len().cmp(&normalized(&a.prefix).len()));

        Ok(Self {
            rules,
            public_paths,
        })
    }

    /// Resolves `path` to its rule, or `None` when no rule matches.
    pub fn classify(&self, path: &str) -> Option<Route<'_>> {
        let rule = self.rules.iter().find(|rule| rule.matches(path))?;

        let access = if rule.public || self.is_public_path(path) {
            Access::Public
        } else {
            Access::Protected
        };

        Some(Route { rule, access })
    }

    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|pattern| pattern.matches(path))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn public_paths(&self) -> &[PathPattern] {
        &self.public_paths
    }
}

fn normalized(prefix: &str) -> &str {
    if prefix.len() > 1 {
        prefix.trim_end_matches('/')
    } else {
        prefix
    }
}
