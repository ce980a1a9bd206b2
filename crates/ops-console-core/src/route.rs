//! Route descriptors and the compiled route table.
//!
//! Routes are declared as a tree of [`RouteConfig`] nodes. Children inherit
//! the parent's path prefix and, unless they declare their own, the parent's
//! `requiresAuth` flag. [`RouteTable::compile`] folds that tree once into a
//! flat lookup table so navigation never has to re-walk it.
//!
//! A route that declares no `requiresAuth` on itself or any ancestor is
//! protected. Paths that are not in the table at all are protected as well.
//!
//! Matching is ASCII case-insensitive: `/Test-Api` finds the `/test-api`
//! entry. A resolved location keeps the casing it was requested with unless
//! an alias was followed.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of redirect aliases followed while resolving a path.
pub const MAX_REDIRECT_HOPS: usize = 8;

/// Errors raised while compiling a route tree.
///
/// These are configuration defects and surface at startup, never during
/// navigation.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Two routable entries resolve to the same path
    #[error("duplicate route path: {0}")]
    DuplicatePath(String),

    /// Path contains characters that can never match a location
    #[error("invalid route path: {0:?}")]
    InvalidPath(String),

    /// Redirect aliases loop or chain too deep
    #[error("redirect loop starting at {0}")]
    RedirectLoop(String),

    /// Route tree could not be parsed
    #[error("route parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A declared route (one node of the route tree).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// Path segment; absolute when it starts with `/`, else relative to the parent
    pub path: String,
    /// Optional route name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Access policy; `None` inherits from the nearest ancestor
    #[serde(default, alias = "requires_auth", skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    /// Alias target; navigating here lands on this path instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Nested routes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteConfig>,
}

impl RouteConfig {
    /// Create a route for `path` with inherited access policy
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the route name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the route (and undeclared descendants) as public
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = Some(false);
        self
    }

    /// Mark the route (and undeclared descendants) as protected
    #[must_use]
    pub fn protected(mut self) -> Self {
        self.requires_auth = Some(true);
        self
    }

    /// Turn the route into an alias for `target`
    #[must_use]
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    /// Attach nested routes
    #[must_use]
    pub fn with_children(mut self, children: Vec<RouteConfig>) -> Self {
        self.children = children;
        self
    }
}

/// The platform's route table.
///
/// Only `/login` and the `/test-api` diagnostic page are public; everything
/// under the main layout is protected.
#[must_use]
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/login").named("Login").public(),
        RouteConfig::new("/test-api").named("TestApi").public(),
        RouteConfig::new("/").protected().with_children(vec![
            RouteConfig::new("").redirect_to("/dashboard"),
            RouteConfig::new("dashboard").named("Dashboard"),
            RouteConfig::new("resources").named("Resources"),
            RouteConfig::new("monitoring").named("Monitoring"),
            RouteConfig::new("alerts").named("Alerts"),
            RouteConfig::new("alerts/rules").named("AlertRules"),
        ]),
    ]
}

/// A flattened table entry with its access policy resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRoute {
    /// Full normalized path
    pub path: String,
    /// Route name, if declared
    pub name: Option<String>,
    /// Resolved access policy
    pub requires_auth: bool,
    /// Alias target (full normalized path)
    pub redirect: Option<String>,
}

/// A concrete navigation target after alias resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLocation {
    /// Normalized path
    pub path: String,
    /// Route name, if the path is known
    pub name: Option<String>,
    /// Whether a session token is needed to enter
    pub requires_auth: bool,
}

impl RouteLocation {
    /// Build a location directly, bypassing any route table
    pub fn new(path: impl AsRef<str>, requires_auth: bool) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            name: None,
            requires_auth,
        }
    }

    /// Location for a path the table does not know (fail-closed)
    fn unknown(path: String) -> Self {
        Self {
            path,
            name: None,
            requires_auth: true,
        }
    }
}

/// Compiled, immutable route lookup table
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<ResolvedRoute>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Compile a route tree into a flat table.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] on duplicate or malformed paths and on
    /// looping redirect aliases.
    pub fn compile(routes: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut table = Self::default();
        for route in routes {
            table.insert(route, "", None)?;
        }
        table.check_redirects()?;
        Ok(table)
    }

    /// Parse a JSON route tree and compile it
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Parse`] on malformed JSON, or any compile error.
    pub fn from_json(json: &str) -> Result<Self, RouteError> {
        let routes: Vec<RouteConfig> = serde_json::from_str(json)?;
        Self::compile(&routes)
    }

    fn insert(
        &mut self,
        route: &RouteConfig,
        parent: &str,
        inherited: Option<bool>,
    ) -> Result<(), RouteError> {
        if route.path.chars().any(char::is_whitespace) {
            return Err(RouteError::InvalidPath(route.path.clone()));
        }

        let path = join_path(parent, &route.path);
        let requires_auth = route.requires_auth.or(inherited);

        // A layout whose own path is taken over by a child is not routable itself
        let shadowed = route.redirect.is_none()
            && route
                .children
                .iter()
                .any(|child| join_path(&path, &child.path) == path);

        if !shadowed {
            let key = route_key(&path);
            if self.index.contains_key(&key) {
                return Err(RouteError::DuplicatePath(path));
            }
            self.index.insert(key, self.entries.len());
            self.entries.push(ResolvedRoute {
                path: path.clone(),
                name: route.name.clone(),
                requires_auth: requires_auth.unwrap_or(true),
                redirect: route.redirect.as_deref().map(|t| join_path(parent, t)),
            });
        }

        for child in &route.children {
            self.insert(child, &path, requires_auth)?;
        }
        Ok(())
    }

    fn check_redirects(&self) -> Result<(), RouteError> {
        for entry in self.entries.iter().filter(|e| e.redirect.is_some()) {
            let mut seen = HashSet::from([route_key(&entry.path)]);
            let mut next = entry.redirect.as_deref();
            let mut hops = 0;
            while let Some(target) = next {
                hops += 1;
                if hops > MAX_REDIRECT_HOPS || !seen.insert(route_key(target)) {
                    return Err(RouteError::RedirectLoop(entry.path.clone()));
                }
                next = self.lookup(target).and_then(|r| r.redirect.as_deref());
            }
        }
        Ok(())
    }

    /// Look up the entry for a location (normalized first)
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&ResolvedRoute> {
        self.index
            .get(&route_key(&normalize_path(path)))
            .map(|&i| &self.entries[i])
    }

    /// Resolve a requested location through aliases to its final target.
    ///
    /// Unknown paths resolve to a protected location.
    #[must_use]
    pub fn resolve(&self, path: &str) -> RouteLocation {
        let mut current = normalize_path(path);
        for _ in 0..=MAX_REDIRECT_HOPS {
            let Some(route) = self.lookup(&current) else {
                return RouteLocation::unknown(current);
            };
            match &route.redirect {
                Some(target) => current.clone_from(target),
                None => {
                    return RouteLocation {
                        path: current,
                        name: route.name.clone(),
                        requires_auth: route.requires_auth,
                    };
                }
            }
        }
        RouteLocation::unknown(current)
    }

    /// All entries in declaration order
    #[must_use]
    pub fn entries(&self) -> &[ResolvedRoute] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize a location: drop query and fragment, collapse slashes, and
/// strip the trailing slash (except on `/`).
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let segments: Vec<&str> = raw[..end].split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn route_key(path: &str) -> String {
    path.to_ascii_lowercase()
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        normalize_path(child)
    } else {
        normalize_path(&format!("{parent}/{child}"))
    }
}
