//! Route table and navigation guards.
//!
//! Every navigation is resolved against the current [`Session`] snapshot and
//! yields either "render" or "redirect". Guards are total functions of the
//! session: they never fail and never cache a decision.

use tracing::debug;

use crate::models::Role;
use crate::session::Session;

pub mod paths {
    pub const LOGIN: &str = "/login";
    pub const UNAUTHORIZED: &str = "/unauthorized";
    /// Kept for old bookmarks; always lands on the super-admin dashboard
    pub const LEGACY_DASHBOARD: &str = "/dashboard";
    pub const SUPER_ADMIN_DASHBOARD: &str = "/super-admin/dashboard";
    pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
    pub const USER_DASHBOARD: &str = "/user/dashboard";
    pub const PROFILE: &str = "/profile";
}

/// Where an authenticated user lands when visiting a public view
pub fn landing_path(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => paths::SUPER_ADMIN_DASHBOARD,
        Role::Admin => paths::ADMIN_DASHBOARD,
        Role::User => paths::USER_DASHBOARD,
    }
}

/// Result of evaluating a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Redirect(&'static str),
}

/// Guard for views that require a session.
///
/// An empty `allowed` set admits any authenticated role.
pub fn protected(session: &Session, allowed: &[Role]) -> Outcome {
    let Some(role) = session.role() else {
        return Outcome::Redirect(paths::LOGIN);
    };
    if !allowed.is_empty() && !allowed.contains(&role) {
        return Outcome::Redirect(paths::UNAUTHORIZED);
    }
    Outcome::Render
}

/// Guard for views only meaningful while logged out (the login form).
pub fn public(session: &Session) -> Outcome {
    match session.role() {
        Some(role) => Outcome::Redirect(landing_path(role)),
        None => Outcome::Render,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Public,
    Protected(Vec<Role>),
    /// Unconditional redirect, independent of the session
    Redirect(&'static str),
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: &'static str,
    pub guard: Guard,
}

impl RouteRule {
    pub fn public(pattern: &'static str) -> Self {
        Self {
            pattern,
            guard: Guard::Public,
        }
    }

    pub fn protected(pattern: &'static str, allowed: &[Role]) -> Self {
        Self {
            pattern,
            guard: Guard::Protected(allowed.to_vec()),
        }
    }

    pub fn redirect(pattern: &'static str, to: &'static str) -> Self {
        Self {
            pattern,
            guard: Guard::Redirect(to),
        }
    }

    /// Match `path` against this rule's pattern, returning captured params.
    ///
    /// Segments starting with `:` match any single non-empty segment.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let pattern: Vec<&str> = segments(self.pattern).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = Vec::new();
        for (expected, got) in pattern.iter().zip(actual.iter()) {
            if let Some(name) = expected.strip_prefix(':') {
                params.push((name.to_string(), got.to_string()));
            } else if expected != got {
                return None;
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

/// A view the router decided to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub pattern: &'static str,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render(RouteMatch),
    Redirect(&'static str),
}

impl Decision {
    pub fn is_render(&self) -> bool {
        matches!(self, Decision::Render(_))
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<RouteRule>,
}

impl Router {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The portal's route table
    pub fn portal() -> Self {
        const STAFF: &[Role] = &[Role::Admin, Role::SuperAdmin];
        const SUPER: &[Role] = &[Role::SuperAdmin];
        const USER: &[Role] = &[Role::User];

        Self::new(vec![
            RouteRule::public(paths::LOGIN),
            RouteRule::protected(paths::UNAUTHORIZED, &[]),
            RouteRule::protected(paths::PROFILE, &[]),
            RouteRule::redirect(paths::LEGACY_DASHBOARD, paths::SUPER_ADMIN_DASHBOARD),
            RouteRule::protected(paths::SUPER_ADMIN_DASHBOARD, SUPER),
            RouteRule::protected("/super-admin/users", SUPER),
            RouteRule::protected("/super-admin/services", SUPER),
            RouteRule::protected(paths::ADMIN_DASHBOARD, STAFF),
            RouteRule::protected("/admin/students", STAFF),
            RouteRule::protected("/admin/students/:id", STAFF),
            RouteRule::protected("/admin/documents", STAFF),
            RouteRule::protected("/admin/users", STAFF),
            RouteRule::protected(paths::USER_DASHBOARD, USER),
            RouteRule::protected("/user/documents", USER),
            RouteRule::protected("/user/students", USER),
        ])
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Decide whether `path` renders for `session`, or where to go instead.
    ///
    /// Unmatched paths redirect to the login view unconditionally.
    pub fn resolve(&self, path: &str, session: &Session) -> Decision {
        let Some((rule, params)) = self
            .rules
            .iter()
            .find_map(|rule| rule.matches(path).map(|params| (rule, params)))
        else {
            debug!(path, "No route matched");
            return Decision::Redirect(paths::LOGIN);
        };

        let outcome = match &rule.guard {
            Guard::Public => public(session),
            Guard::Protected(allowed) => protected(session, allowed),
            Guard::Redirect(to) => Outcome::Redirect(*to),
        };

        debug!(path, pattern = rule.pattern, ?outcome, "Route resolved");
        match outcome {
            Outcome::Render => Decision::Render(RouteMatch {
                pattern: rule.pattern,
                params,
            }),
            Outcome::Redirect(to) => Decision::Redirect(to),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::portal()
    }
}
