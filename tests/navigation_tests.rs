//! End-to-end navigation gate tests
//!
//! Exercises the gate the way the console wires it: a route table compiled
//! from configuration and a session store that login/logout write to.

use std::sync::Arc;

use ops_console::config::Config;
use ops_console::session::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
use ops_console_core::{Decision, NavigationGate, RouteConfig, RouteTable, SessionPhase};

fn redirect(path: &str) -> Decision {
    Decision::RedirectTo(path.to_string())
}

fn gate_with(store: Arc<dyn SessionStore>) -> NavigationGate<Arc<dyn SessionStore>> {
    let table = Config::default().route_table().unwrap();
    NavigationGate::new(table, store)
}

/// Scenario 1: token absent, `/dashboard` → login
#[test]
fn test_anonymous_dashboard() {
    let gate = gate_with(Arc::new(MemorySessionStore::new()));
    assert_eq!(gate.navigate("/dashboard", None), redirect("/login"));
}

/// Scenario 2: token present, `/login` → dashboard
#[test]
fn test_authenticated_login() {
    let gate = gate_with(Arc::new(MemorySessionStore::with_token("tok")));
    assert_eq!(gate.navigate("/login", None), redirect("/dashboard"));
}

/// Scenario 3: token absent, `/login` → proceed
#[test]
fn test_anonymous_login() {
    let gate = gate_with(Arc::new(MemorySessionStore::new()));
    assert_eq!(gate.navigate("/login", None), Decision::Proceed);
}

/// Scenario 4: token present, `/resources` → proceed
#[test]
fn test_authenticated_resources() {
    let gate = gate_with(Arc::new(MemorySessionStore::with_token("tok")));
    assert_eq!(gate.navigate("/resources", Some("/dashboard")), Decision::Proceed);
}

/// Scenario 5: token absent, public diagnostic route → proceed
#[test]
fn test_anonymous_test_api() {
    let gate = gate_with(Arc::new(MemorySessionStore::new()));
    assert_eq!(gate.navigate("/test-api", None), Decision::Proceed);
}

/// Every protected route is closed to anonymous sessions
#[test]
fn test_all_protected_routes_redirect_anonymous() {
    let gate = gate_with(Arc::new(MemorySessionStore::new()));
    let protected: Vec<String> = gate
        .routes()
        .entries()
        .iter()
        .filter(|e| e.requires_auth)
        .map(|e| e.path.clone())
        .collect();
    assert_eq!(protected.len(), 6);
    for path in protected {
        assert_eq!(gate.navigate(&path, None), redirect("/login"), "{path}");
    }
}

/// Same request, same token state, same decision
#[test]
fn test_idempotent_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
    let gate = gate_with(store.clone());

    for _ in 0..3 {
        assert_eq!(gate.navigate("/alerts", None), redirect("/login"));
    }
    assert_eq!(gate.phase(), SessionPhase::Anonymous);

    store.store(StoredSession::new("tok", Some("admin".into()))).unwrap();
    for _ in 0..3 {
        assert_eq!(gate.navigate("/alerts", None), Decision::Proceed);
    }
    assert_eq!(gate.phase(), SessionPhase::Authenticated);
}

/// The gate never writes the session
#[test]
fn test_gate_does_not_mutate_session() {
    let store = Arc::new(MemorySessionStore::with_token("tok"));
    let gate = gate_with(store.clone());
    let _ = gate.navigate("/login", None);
    let _ = gate.navigate("/nowhere", None);
    assert_eq!(store.token().unwrap().as_deref(), Some("tok"));
}

/// A custom table from configuration keeps the fail-closed default
#[test]
fn test_configured_routes_default_protected() {
    let config = Config {
        routes: vec![
            RouteConfig::new("/login").public(),
            RouteConfig::new("/status").public(),
            RouteConfig::new("/reports").with_children(vec![RouteConfig::new("daily")]),
        ],
        ..Config::default()
    };
    let table: RouteTable = config.route_table().unwrap();
    let gate = NavigationGate::new(table, false);

    assert_eq!(gate.navigate("/status", None), Decision::Proceed);
    assert_eq!(gate.navigate("/reports/daily", None), redirect("/login"));
    assert_eq!(gate.navigate("/reports", None), redirect("/login"));
}
