//! Request and Response models for the dashboard API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CapacityRequest, LruTouchRequest, PublishRequest, SendRequest, TtlAddRequest};
pub use responses::{
    AckResponse, CapacityResponse, DeleteResponse, ErrorResponse, HealthResponse, LruResponse,
    NodeResponse, NotificationsResponse, PubSubCountResponse, PubSubResponse, StateResponse, TouchResponse,
    TtlEntryResponse, TtlResponse,
};
