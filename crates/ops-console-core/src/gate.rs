//! Navigation gate
//!
//! Evaluated before every route transition. Decision order, first match wins:
//!
//! 1. protected destination and no session token: redirect to `/login`
//! 2. destination is `/login` and a token is present: redirect to `/dashboard`
//! 3. otherwise proceed
//!
//! The gate holds no mutable state. Evaluating the same request against the
//! same token presence always yields the same [`Decision`].

use serde::{Deserialize, Serialize};

use crate::route::{RouteLocation, RouteTable, normalize_path};
use crate::session::{SessionPhase, SessionState};

/// Login route
pub const LOGIN_PATH: &str = "/login";

/// Landing route for authenticated sessions
pub const HOME_PATH: &str = "/dashboard";

/// Outcome of a navigation check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum Decision {
    /// Let the transition complete
    Proceed,
    /// Abort the transition and navigate here instead
    RedirectTo(String),
}

impl Decision {
    /// Redirect target, if any
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Proceed => None,
            Self::RedirectTo(path) => Some(path),
        }
    }
}

/// A single navigation event (`from` is `None` on initial load)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    /// Destination
    pub to: RouteLocation,
    /// Current location
    pub from: Option<RouteLocation>,
}

/// A navigation decision together with what it was decided on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Resolved request
    pub request: NavigationRequest,
    /// Session phase at the time of the decision
    pub phase: SessionPhase,
    /// Outcome
    pub decision: Decision,
}

/// Decide a navigation to `to` given token presence.
#[must_use]
pub fn decide(to: &RouteLocation, has_token: bool) -> Decision {
    if to.requires_auth && !has_token {
        Decision::RedirectTo(LOGIN_PATH.to_string())
    } else if to.path.eq_ignore_ascii_case(LOGIN_PATH) && has_token {
        Decision::RedirectTo(HOME_PATH.to_string())
    } else {
        Decision::Proceed
    }
}

/// Route guard bound to a compiled route table and an injected session view
#[derive(Debug, Clone)]
pub struct NavigationGate<S> {
    routes: RouteTable,
    session: S,
}

impl<S: SessionState> NavigationGate<S> {
    /// Create a gate over `routes`, reading token presence from `session`
    pub fn new(routes: RouteTable, session: S) -> Self {
        Self { routes, session }
    }

    /// The compiled route table
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The injected session view
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Current session phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Build a request by resolving both locations against the route table
    #[must_use]
    pub fn request(&self, to: &str, from: Option<&str>) -> NavigationRequest {
        NavigationRequest {
            to: self.routes.resolve(to),
            from: from.map(|f| self.routes.resolve(f)),
        }
    }

    /// Decide an already-resolved request
    #[must_use]
    pub fn decide(&self, request: &NavigationRequest) -> Decision {
        decide(&request.to, self.session.has_token())
    }

    /// Decide a navigation from raw locations.
    ///
    /// Redirect aliases are followed first. When the check passes but an alias
    /// was involved, the decision redirects to the canonical location.
    #[must_use]
    pub fn navigate(&self, to: &str, from: Option<&str>) -> Decision {
        self.evaluate(to, from).decision
    }

    /// Like [`navigate`](Self::navigate), but also returns the resolved
    /// request and the session phase. The session is read exactly once, so
    /// phase and decision always agree.
    #[must_use]
    pub fn evaluate(&self, to: &str, from: Option<&str>) -> Evaluation {
        let has_token = self.session.has_token();
        let requested = normalize_path(to);
        let request = self.request(to, from);
        let decision = match decide(&request.to, has_token) {
            Decision::Proceed if request.to.path != requested => {
                Decision::RedirectTo(request.to.path.clone())
            }
            decision => decision,
        };
        Evaluation {
            request,
            phase: has_token.phase(),
            decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RouteConfig, default_routes};
    use crate::session::SessionFn;
    use pretty_assertions::assert_eq;

    fn gate(token: bool) -> NavigationGate<bool> {
        NavigationGate::new(RouteTable::compile(&default_routes()).unwrap(), token)
    }

    fn redirect(path: &str) -> Decision {
        Decision::RedirectTo(path.to_string())
    }

    #[test]
    fn test_anonymous_dashboard_redirects_to_login() {
        assert_eq!(gate(false).navigate("/dashboard", None), redirect("/login"));
    }

    #[test]
    fn test_authenticated_login_redirects_to_dashboard() {
        assert_eq!(gate(true).navigate("/login", Some("/resources")), redirect("/dashboard"));
    }

    #[test]
    fn test_anonymous_login_proceeds() {
        assert_eq!(gate(false).navigate("/login", None), Decision::Proceed);
    }

    #[test]
    fn test_authenticated_resources_proceeds() {
        assert_eq!(gate(true).navigate("/resources", Some("/dashboard")), Decision::Proceed);
    }

    #[test]
    fn test_anonymous_public_diagnostic_proceeds() {
        assert_eq!(gate(false).navigate("/test-api", None), Decision::Proceed);
    }

    #[test]
    fn test_protected_routes_need_token() {
        let anonymous = gate(false);
        for entry in anonymous.routes().entries().iter().filter(|e| e.requires_auth) {
            assert_eq!(anonymous.navigate(&entry.path, None), redirect("/login"), "{}", entry.path);
        }
    }

    #[test]
    fn test_public_routes_proceed_except_login_with_token() {
        for token in [false, true] {
            let g = gate(token);
            for entry in g.routes().entries().iter().filter(|e| !e.requires_auth) {
                let expected = if token && entry.path == LOGIN_PATH {
                    redirect("/dashboard")
                } else {
                    Decision::Proceed
                };
                assert_eq!(g.navigate(&entry.path, None), expected, "{}", entry.path);
            }
        }
    }

    #[test]
    fn test_decision_is_idempotent() {
        for token in [false, true] {
            let g = gate(token);
            let request = g.request("/monitoring", Some("/login"));
            assert_eq!(g.decide(&request), g.decide(&request));
            assert_eq!(g.navigate("/login", None), g.navigate("/login", None));
        }
    }

    #[test]
    fn test_root_alias() {
        assert_eq!(gate(true).navigate("/", None), redirect("/dashboard"));
        assert_eq!(gate(false).navigate("/", None), redirect("/login"));
    }

    #[test]
    fn test_unknown_route_is_protected() {
        assert_eq!(gate(false).navigate("/settings", None), redirect("/login"));
        assert_eq!(gate(true).navigate("/settings", None), Decision::Proceed);
    }

    #[test]
    fn test_query_string_ignored() {
        assert_eq!(gate(true).navigate("/login?next=/alerts", None), redirect("/dashboard"));
        assert_eq!(gate(true).navigate("/alerts/rules/", None), Decision::Proceed);
    }

    #[test]
    fn test_mixed_case_paths() {
        assert_eq!(gate(false).navigate("/Test-Api", None), Decision::Proceed);
        assert_eq!(gate(false).navigate("/Dashboard", None), redirect("/login"));
        assert_eq!(gate(true).navigate("/Dashboard", None), Decision::Proceed);
        assert_eq!(gate(true).navigate("/LOGIN", None), redirect("/dashboard"));
        assert_eq!(gate(false).navigate("/LOGIN", None), Decision::Proceed);
    }

    #[test]
    fn test_evaluate_reads_session_once() {
        use std::cell::Cell;

        let reads = Cell::new(0);
        let session = SessionFn(|| {
            reads.set(reads.get() + 1);
            reads.get() == 1
        });
        let g = NavigationGate::new(RouteTable::compile(&default_routes()).unwrap(), session);

        let evaluation = g.evaluate("/login", Some("/alerts"));
        assert_eq!(reads.get(), 1);
        assert_eq!(evaluation.phase, SessionPhase::Authenticated);
        assert_eq!(evaluation.decision, redirect("/dashboard"));
        assert_eq!(evaluation.request.from.unwrap().path, "/alerts");
    }

    #[test]
    fn test_decide_uses_resolved_flag_only() {
        let open = RouteLocation::new("/anything", false);
        assert_eq!(decide(&open, false), Decision::Proceed);
        let closed = RouteLocation::new("/anything", true);
        assert_eq!(decide(&closed, false), redirect("/login"));
        assert_eq!(decide(&closed, true), Decision::Proceed);
    }

    #[test]
    fn test_public_login_declared_protected_still_redirects_home() {
        let table = RouteTable::compile(&[RouteConfig::new("/login").protected()]).unwrap();
        assert_eq!(NavigationGate::new(table.clone(), false).navigate("/login", None), redirect("/login"));
        assert_eq!(NavigationGate::new(table, true).navigate("/login", None), redirect("/dashboard"));
    }

    #[test]
    fn test_decision_serializes_tagged() {
        let json = serde_json::to_value(redirect("/login")).unwrap();
        assert_eq!(json, serde_json::json!({"decision": "redirect_to", "path": "/login"}));
        let json = serde_json::to_value(Decision::Proceed).unwrap();
        assert_eq!(json, serde_json::json!({"decision": "proceed"}));
    }
}
