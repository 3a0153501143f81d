//! Routes, their metadata, and path matching.
//!
//! Each route declares what a visitor needs before the guard lets them in:
//!
//! - `requires_auth`: a usable session (default `true`)
//! - `requires_admin`: a cached user with the admin role
//!
//! Patterns are `/`-separated segments. A segment is either literal text,
//! a `:name` parameter, or a trailing `:name?` optional parameter:
//!
//! ```text
//! /                      matches  /
//! /charts/:device_id?    matches  /charts, /charts/dev-7
//! /login                 matches  /login
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::GuardError;

/// Name of the login route in [`RouteTable::dashboard`].
pub const LOGIN_ROUTE: &str = "login";

// ---------------------------------------------------------------------------
// RouteMeta
// ---------------------------------------------------------------------------

/// Access requirements of a route.
///
/// `Default` is the safe choice: authentication required, no admin role.
/// Paths that match no route get this default too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl Default for RouteMeta {
    fn default() -> Self {
        Self {
            requires_auth: true,
            requires_admin: false,
        }
    }
}

impl RouteMeta {
    /// Open to everyone (the login page).
    pub fn public() -> Self {
        Self {
            requires_auth: false,
            requires_admin: false,
        }
    }

    /// Logged-in admins only.
    pub fn admin() -> Self {
        Self {
            requires_auth: true,
            requires_admin: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

/// A named route with a path pattern and access requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    name: String,
    pattern: String,
    segments: Vec<Segment>,
    meta: RouteMeta,
}

impl Route {
    /// Parses `pattern` into a route.
    ///
    /// # Errors
    /// [`GuardError::InvalidPattern`] if the pattern doesn't start with `/`,
    /// has an unnamed parameter, or has an optional parameter before the
    /// last segment.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        meta: RouteMeta,
    ) -> Result<Self, GuardError> {
        let pattern = pattern.into();
        let invalid = |reason: &str| GuardError::InvalidPattern {
            pattern: pattern.clone(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, seg) in raw.iter().enumerate() {
            let Some(param) = seg.strip_prefix(':') else {
                segments.push(Segment::Literal((*seg).to_string()));
                continue;
            };
            let (name, optional) = match param.strip_suffix('?') {
                Some(name) => (name, true),
                None => (param, false),
            };
            if name.is_empty() {
                return Err(invalid("parameter without a name"));
            }
            if optional && i + 1 != raw.len() {
                return Err(invalid("optional parameter must be the last segment"));
            }
            segments.push(Segment::Param {
                name: name.to_string(),
                optional,
            });
        }

        Ok(Self {
            name: name.into(),
            pattern,
            segments,
            meta,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn meta(&self) -> RouteMeta {
        self.meta
    }

    /// Matches path segments against this route, returning the captured
    /// parameters on success.
    fn matches(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut parts = parts.iter();

        for segment in &self.segments {
            match (segment, parts.next()) {
                (Segment::Literal(lit), Some(part)) if lit == part => {}
                (Segment::Literal(_), _) => return None,
                (Segment::Param { name, .. }, Some(part)) => {
                    params.insert(name.clone(), (*part).to_string());
                }
                (Segment::Param { optional: true, .. }, None) => {}
                (Segment::Param { optional: false, .. }, None) => return None,
            }
        }

        // Leftover path segments mean the path is longer than the pattern.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Where a navigation is headed, after resolving its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The requested path, without query string or fragment.
    pub path: String,

    /// Name of the matched route, `None` if nothing matched.
    pub name: Option<String>,

    /// Captured path parameters.
    pub params: BTreeMap<String, String>,

    /// Requirements of the matched route, or the default for unknown paths.
    pub meta: RouteMeta,
}

impl Target {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

/// The application's routes, matched in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Builds a table from `routes`.
    ///
    /// # Errors
    /// [`GuardError::DuplicateRoute`] if two routes share a name.
    pub fn new(routes: Vec<Route>) -> Result<Self, GuardError> {
        let mut seen = HashSet::new();
        for route in &routes {
            if !seen.insert(route.name.as_str()) {
                return Err(GuardError::DuplicateRoute(route.name.clone()));
            }
        }
        Ok(Self { routes })
    }

    /// The dashboard's routes: the chart views behind the gate and the
    /// public login page.
    pub fn dashboard() -> Self {
        let routes = vec![
            Route::new("home", "/", RouteMeta::default()),
            Route::new("charts", "/charts/:device_id?", RouteMeta::default()),
            Route::new(LOGIN_ROUTE, "/login", RouteMeta::public()),
        ];
        // The patterns above are fixed and covered by tests.
        let routes = routes
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("dashboard route patterns are valid");
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Resolves `path` to a [`Target`].
    ///
    /// Query strings and fragments are ignored. Paths that match no route
    /// resolve to an unnamed target with default (auth required) metadata.
    pub fn resolve(&self, path: &str) -> Target {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for route in &self.routes {
            if let Some(params) = route.matches(&parts) {
                return Target {
                    path,
                    name: Some(route.name.clone()),
                    params,
                    meta: route.meta,
                };
            }
        }

        Target {
            path,
            name: None,
            params: BTreeMap::new(),
            meta: RouteMeta::default(),
        }
    }
}
