//! Route table file (`ROUTES_FILE`).
//!
//! ```json
//! {
//!   "routes": [
//!     { "name": "auth", "prefix": "/api/auth", "target": "http://auth:4001" },
//!     { "name": "incidents", "prefix": "/api/incidents", "target": "http://incidents:4002",
//!       "rewrite": { "pattern": "^/api/incidents", "replacement": "/api" }, "timeout_secs": 5 }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use std::path::Path;
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

use crate::domain::{PathPattern, PathRewrite, RouteRule, RouteTable};

#[derive(Debug, Deserialize, Validate)]
pub struct RoutesFile {
    #[validate(nested)]
    pub routes: Vec<RouteDefinition>,
}

#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct RouteDefinition {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    #[validate(custom(function = "validate_prefix"))]
    pub prefix: String,

    #[validate(url(message = "Invalid target URL"))]
    pub target: String,

    #[serde(default)]
    pub public: bool,

    pub rewrite: Option<RewriteDefinition>,

    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    #[serde(default, rename = "timeout_secs")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
pub struct RewriteDefinition {
    pub pattern: String,
    pub replacement: String,
}

fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if !prefix.starts_with('/') {
        return Err(ValidationError::new("prefix_must_start_with_slash"));
    }
    if prefix.contains(['?', '#', '*']) {
        return Err(ValidationError::new("prefix_must_be_a_plain_path"));
    }
    Ok(())
}

impl RouteDefinition {
    fn into_rule(self) -> Result<RouteRule> {
        let target = Url::parse(&self.target)
            .with_context(|| format!("route '{}': invalid target", self.name))?;

        let mut rule = RouteRule::new(self.name, self.prefix, target);

        if let Some(rewrite) = self.rewrite {
            let rewrite = PathRewrite::new(&rewrite.pattern, rewrite.replacement)
                .with_context(|| format!("route '{}': invalid rewrite pattern", rule.name))?;
            rule = rule.with_rewrite(rewrite);
        }
        if self.public {
            rule = rule.public();
        }
        if let Some(timeout) = self.timeout {
            rule = rule.with_timeout(timeout);
        }

        Ok(rule)
    }
}

/// Parses and validates a routes document into rules.
///
/// # Errors
///
/// Returns an error if the JSON is malformed, a definition fails validation, or a
/// rewrite pattern is not a valid regex.
pub fn parse_route_rules(json: &str) -> Result<Vec<RouteRule>> {
    let file: RoutesFile = serde_json::from_str(json).context("Routes file is not valid JSON")?;
    if file.routes.is_empty() {
        anyhow::bail!("Routes file must define at least one route");
    }
    file.validate().context("Routes file failed validation")?;

    file.routes
        .into_iter()
        .map(RouteDefinition::into_rule)
        .collect()
}

/// Reads `path` and builds the route table together with the public allow-list.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails [`parse_route_rules`], or
/// contains duplicate prefixes.
pub fn load_route_table(path: &Path, public_paths: Vec<PathPattern>) -> Result<RouteTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read routes file '{}'", path.display()))?;

    let rules = parse_route_rules(&raw)
        .with_context(|| format!("Invalid routes file '{}'", path.display()))?;

    RouteTable::new(rules, public_paths)
}
