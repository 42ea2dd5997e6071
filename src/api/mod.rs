//! API Module
//!
//! HTTP handlers and routing for the dashboard's JSON surface.
//!
//! # Endpoints
//! - `GET /state` - Full snapshot with derived values
//! - `/lru`, `/ttl` - Simulator views and actions
//! - `/notifications` - Visible notifications, dismiss and read
//! - `/pubsub/:channel/*` - Simulated pub/sub
//! - `/connection/*` - Push client control
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
