//! Development reverse proxy
//!
//! Forwards everything under the configured prefix (`/api` by default) to
//! the backend origin, so a front-end served from the same port can reach the
//! API without cross-origin setup. The target is picked per environment
//! (local process or container) through configuration.

mod forward;
mod router;
mod server;

pub use forward::matches_prefix;
pub use router::{AppState, create_router};
pub use server::DevProxy;
