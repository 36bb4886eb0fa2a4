//! Static routing rules: path prefixes, rewrites and public-path patterns.

use regex::Regex;
use std::time::Duration;
use url::Url;

/// Returns true when `path` equals `prefix` or continues it at a segment boundary.
///
/// `/api/auth` matches `/api/auth` and `/api/auth/login`, but not `/api/authors`.
pub(crate) fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Regex-based path rewrite applied before forwarding.
#[derive(Debug, Clone)]
pub struct PathRewrite {
    pattern: Regex,
    replacement: String,
}

impl PathRewrite {
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Replaces the first match of the pattern. A result that loses its leading
    /// slash (e.g. `^/api/users` → `""`) is re-rooted at `/`.
    pub fn apply(&self, path: &str) -> String {
        let rewritten = self
            .pattern
            .replace(path, self.replacement.as_str())
            .into_owned();
        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{rewritten}")
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Mapping from an inbound path prefix to a backend service.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub name: String,
    pub prefix: String,
    pub target: Url,
    pub rewrite: Option<PathRewrite>,
    /// When true the rule never requires a credential.
    pub public: bool,
    /// Overrides the forwarder's default deadline.
    pub timeout: Option<Duration>,
}

impl RouteRule {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, target: Url) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            target,
            rewrite: None,
            public: false,
            timeout: None,
        }
    }

    pub fn with_rewrite(mut self, rewrite: PathRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        is_segment_prefix(&self.prefix, path)
    }

    /// Path the upstream service receives for an inbound `path`.
    pub fn upstream_path(&self, path: &str) -> String {
        match &self.rewrite {
            Some(rewrite) => rewrite.apply(path),
            None => path.to_string(),
        }
    }
}

/// Entry of the public allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    /// Parses `"/x"` as exact and `"/x/*"` as a prefix pattern.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_suffix("/*").or_else(|| raw.strip_suffix('*')) {
            Some(prefix) if prefix.is_empty() => PathPattern::Prefix("/".to_string()),
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(normalize_exact(raw).to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(expected) => normalize_exact(path) == expected,
            PathPattern::Prefix(prefix) => is_segment_prefix(prefix, path),
        }
    }
}

fn normalize_exact(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}
