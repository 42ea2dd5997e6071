//! API Routes
//!
//! Configures the Axum router with all dashboard endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    disconnect_handler, health_handler, lru_access_handler, lru_capacity_handler,
    lru_clear_handler, lru_delete_handler, lru_handler, lru_reset_stats_handler,
    lru_touch_handler, notification_dismiss_handler, notification_read_handler,
    notifications_clear_handler, notifications_handler, notifications_read_all_handler,
    publish_handler, reconnect_handler, send_handler, state_handler, subscribe_handler,
    ttl_add_handler, ttl_handler, ttl_remove_handler, unsubscribe_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, the dashboard front end is served elsewhere
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/state", get(state_handler))
        // LRU simulator
        .route(
            "/lru",
            get(lru_handler).put(lru_touch_handler).delete(lru_clear_handler),
        )
        .route("/lru/capacity", put(lru_capacity_handler))
        .route("/lru/stats/reset", post(lru_reset_stats_handler))
        // Keys live under their own segment so names like "capacity" stay reachable
        .route("/lru/keys/:key", delete(lru_delete_handler))
        .route("/lru/keys/:key/access", post(lru_access_handler))
        // TTL simulator
        .route("/ttl", get(ttl_handler).put(ttl_add_handler))
        .route("/ttl/:key", delete(ttl_remove_handler))
        // Notifications
        .route(
            "/notifications",
            get(notifications_handler).delete(notifications_clear_handler),
        )
        .route("/notifications/read", post(notifications_read_all_handler))
        .route("/notifications/:id", delete(notification_dismiss_handler))
        .route("/notifications/:id/read", post(notification_read_handler))
        // Pub/sub
        .route("/pubsub/:channel/subscribe", post(subscribe_handler))
        .route("/pubsub/:channel/unsubscribe", post(unsubscribe_handler))
        .route("/pubsub/:channel/publish", post(publish_handler))
        // Push client
        .route("/connection/reconnect", post(reconnect_handler))
        .route("/connection/disconnect", post(disconnect_handler))
        .route("/connection/send", post(send_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
