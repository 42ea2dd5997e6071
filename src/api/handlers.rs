//! API Handlers
//!
//! HTTP request handlers for each dashboard endpoint. Every mutation goes
//! through a store action; reads render the current snapshot.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::error::{Result, SimError};
use crate::models::{
    AckResponse, CapacityRequest, CapacityResponse, DeleteResponse, HealthResponse, LruResponse,
    LruTouchRequest, NotificationsResponse, PubSubCountResponse, PublishRequest, SendRequest,
    StateResponse, TouchResponse, TtlAddRequest, TtlResponse,
};
use crate::notifications::NotificationId;
use crate::push::{OutboundMessage, PushHandle};
use crate::store::Store;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Absent when the server runs without a push client
    pub push: Option<PushHandle>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store, push: None }
    }

    pub fn with_push(store: Store, push: PushHandle) -> Self {
        Self {
            store,
            push: Some(push),
        }
    }

    fn push_handle(&self) -> Result<&PushHandle> {
        self.push
            .as_ref()
            .ok_or_else(|| SimError::Unavailable("push client is not running".to_string()))
    }
}

// == Snapshot ==

/// Handler for GET /state
pub async fn state_handler(State(state): State<AppState>) -> Json<StateResponse> {
    let snapshot = state.store.get_state();
    Json(StateResponse::from_state(&snapshot, Utc::now()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == LRU ==

/// Handler for GET /lru
pub async fn lru_handler(State(state): State<AppState>) -> Json<LruResponse> {
    Json(LruResponse::from_state(&state.store.get_state().lru))
}

/// Handler for PUT /lru
///
/// Inserts the key at the head, or touches it if already present.
pub async fn lru_touch_handler(
    State(state): State<AppState>,
    Json(req): Json<LruTouchRequest>,
) -> Result<Json<TouchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(SimError::Validation(error_msg));
    }

    let outcome = state.store.lru_insert_or_touch(&req.key, req.value)?;
    Ok(Json(TouchResponse::new(req.key, outcome)))
}

/// Handler for POST /lru/keys/:key/access
///
/// Unknown keys answer 404 and leave the counters alone.
pub async fn lru_access_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LruResponse>> {
    state.store.lru_access(&key)?;
    Ok(Json(LruResponse::from_state(&state.store.get_state().lru)))
}

/// Handler for DELETE /lru/keys/:key
pub async fn lru_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.store.lru_delete(&key) {
        return Err(SimError::NotFound(key));
    }
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /lru
pub async fn lru_clear_handler(State(state): State<AppState>) -> Json<AckResponse> {
    state.store.lru_clear();
    Json(AckResponse::new("LRU cache cleared"))
}

/// Handler for PUT /lru/capacity
pub async fn lru_capacity_handler(
    State(state): State<AppState>,
    Json(req): Json<CapacityRequest>,
) -> Result<Json<CapacityResponse>> {
    let evicted = state.store.lru_set_capacity(req.capacity)?;
    Ok(Json(CapacityResponse {
        capacity: req.capacity,
        evicted,
    }))
}

/// Handler for POST /lru/stats/reset
pub async fn lru_reset_stats_handler(State(state): State<AppState>) -> Json<LruResponse> {
    state.store.lru_reset_stats();
    Json(LruResponse::from_state(&state.store.get_state().lru))
}

// == TTL ==

/// Handler for GET /ttl
pub async fn ttl_handler(State(state): State<AppState>) -> Json<TtlResponse> {
    Json(TtlResponse::from_state(&state.store.get_state().ttl, Utc::now()))
}

/// Handler for PUT /ttl
pub async fn ttl_add_handler(
    State(state): State<AppState>,
    Json(req): Json<TtlAddRequest>,
) -> Result<Json<TtlResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(SimError::Validation(error_msg));
    }

    state.store.ttl_add(&req.key, req.value, req.ttl_seconds)?;
    Ok(Json(TtlResponse::from_state(&state.store.get_state().ttl, Utc::now())))
}

/// Handler for DELETE /ttl/:key
pub async fn ttl_remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.store.ttl_remove(&key) {
        return Err(SimError::NotFound(key));
    }
    Ok(Json(DeleteResponse::new(key)))
}

// == Notifications ==

/// Handler for GET /notifications
pub async fn notifications_handler(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse::from_center(&state.store.get_state().notifications))
}

/// Handler for DELETE /notifications
pub async fn notifications_clear_handler(State(state): State<AppState>) -> Json<AckResponse> {
    state.store.clear_notifications();
    Json(AckResponse::new("Notifications cleared"))
}

/// Handler for DELETE /notifications/:id
pub async fn notification_dismiss_handler(
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<AckResponse>> {
    if !state.store.dismiss_notification(id) {
        return Err(SimError::NotFound(format!("notification {}", id)));
    }
    Ok(Json(AckResponse::new(format!("Notification {} dismissed", id))))
}

/// Handler for POST /notifications/:id/read
pub async fn notification_read_handler(
    State(state): State<AppState>,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationsResponse>> {
    if !state.store.mark_notification_read(id) {
        return Err(SimError::NotFound(format!("notification {}", id)));
    }
    Ok(Json(NotificationsResponse::from_center(&state.store.get_state().notifications)))
}

/// Handler for POST /notifications/read
pub async fn notifications_read_all_handler(
    State(state): State<AppState>,
) -> Json<NotificationsResponse> {
    state.store.mark_all_notifications_read();
    Json(NotificationsResponse::from_center(&state.store.get_state().notifications))
}

// == Pub/Sub ==

/// Handler for POST /pubsub/:channel/subscribe
pub async fn subscribe_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<PubSubCountResponse>> {
    let subscribers = state.store.pubsub_subscribe(&channel)?;
    Ok(Json(PubSubCountResponse::new(channel, subscribers)))
}

/// Handler for POST /pubsub/:channel/unsubscribe
pub async fn unsubscribe_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<PubSubCountResponse>> {
    let subscribers = state.store.pubsub_unsubscribe(&channel)?;
    Ok(Json(PubSubCountResponse::new(channel, subscribers)))
}

/// Handler for POST /pubsub/:channel/publish
pub async fn publish_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PubSubCountResponse>> {
    let delivered = state.store.pubsub_publish(&channel, req.payload)?;
    Ok(Json(PubSubCountResponse::new(channel, delivered)))
}

// == Connection ==

/// Handler for POST /connection/reconnect
pub async fn reconnect_handler(State(state): State<AppState>) -> Result<Json<AckResponse>> {
    if !state.push_handle()?.reconnect() {
        return Err(SimError::Unavailable("push client has stopped".to_string()));
    }
    Ok(Json(AckResponse::new("Reconnect requested")))
}

/// Handler for POST /connection/disconnect
pub async fn disconnect_handler(State(state): State<AppState>) -> Result<Json<AckResponse>> {
    if !state.push_handle()?.disconnect() {
        return Err(SimError::Unavailable("push client has stopped".to_string()));
    }
    Ok(Json(AckResponse::new("Disconnect requested")))
}

/// Handler for POST /connection/send
///
/// Fire-and-forget: rejected with 503 unless the channel is connected.
pub async fn send_handler(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(SimError::Validation(error_msg));
    }

    let message = OutboundMessage::new(req.kind, req.data);
    if !state.push_handle()?.send(&message) {
        return Err(SimError::Unavailable(
            "push channel is not connected; message dropped".to_string(),
        ));
    }
    Ok(Json(AckResponse::new("Message sent")))
}
