//! Ops Console Library
//!
//! Client-side companion for the ops platform backend.
//!
//! # Features
//!
//! - **Navigation Gate**: session-gated route table (see [`ops_console_core`])
//! - **Session Store**: durable token storage written by login/logout
//! - **Typed API Client**: auth, resource inventory and monitoring endpoints
//! - **Dev Proxy**: forwards `/api` to a local or containerized backend

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod proxy;
pub mod session;

pub use error::{Error, Result};
pub use ops_console_core::{
    Decision, NavigationGate, NavigationRequest, RouteConfig, RouteLocation, RouteTable,
    SessionPhase, SessionState, default_routes,
};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
