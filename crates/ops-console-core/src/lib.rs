//! Ops console core library
//!
//! Session-gated client-side navigation: a static route tree compiled into a
//! flat lookup table, and a [`NavigationGate`] that decides every transition
//! from the destination's access policy and the presence of a session token.
//!
//! ```
//! use ops_console_core::{Decision, NavigationGate, RouteTable, default_routes};
//!
//! let routes = RouteTable::compile(&default_routes()).unwrap();
//! let gate = NavigationGate::new(routes, false);
//! assert_eq!(gate.navigate("/dashboard", None), Decision::RedirectTo("/login".into()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod gate;
pub mod route;
pub mod session;

pub use gate::{Decision, Evaluation, HOME_PATH, LOGIN_PATH, NavigationGate, NavigationRequest, decide};
pub use route::{
    ResolvedRoute, RouteConfig, RouteError, RouteLocation, RouteTable, default_routes,
    normalize_path,
};
pub use session::{SessionFn, SessionPhase, SessionState};
