//! Dev proxy server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use ops_console_core::NavigationGate;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::session::SessionStore;
use crate::{Error, Result};

/// Development reverse proxy in front of the backend
pub struct DevProxy {
    /// Configuration
    config: Config,
    /// Shared handler state
    state: Arc<AppState>,
}

impl DevProxy {
    /// Create a proxy; the route table is compiled here, once
    ///
    /// # Errors
    ///
    /// Returns an error if the route table does not compile or the upstream
    /// client cannot be built.
    pub fn new(config: Config, session: Arc<dyn SessionStore>) -> Result<Self> {
        let routes = config.route_table()?;

        let client = reqwest::Client::builder()
            .timeout(config.proxy.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_gzip()
            .build()?;

        let state = Arc::new(AppState {
            client,
            target: config.proxy.target.trim_end_matches('/').to_string(),
            prefix: config.proxy.prefix.clone(),
            change_origin: config.proxy.change_origin,
            max_body_size: config.server.max_body_size,
            gate: NavigationGate::new(routes, session),
        });

        Ok(Self { config, state })
    }

    /// Router with all handlers and layers attached
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(
            Arc::clone(&self.state),
            self.config.server.max_concurrent_requests,
        )
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("OPS CONSOLE DEV PROXY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        info!(
            prefix = %self.config.proxy.prefix,
            target = %self.config.proxy.target,
            change_origin = self.config.proxy.change_origin,
            "Forwarding"
        );
        info!(
            routes = self.state.gate.routes().len(),
            phase = %self.state.gate.phase(),
            "Navigation gate ready"
        );
        info!("============================================================");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Proxy(e.to_string()))?;

        info!("Dev proxy stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
