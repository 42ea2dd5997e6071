//! Push Channel Module
//!
//! Real-time feed from the collector: wire format, dispatch into the store,
//! the reconnect machine and the client task that drives it.

mod client;
mod dispatch;
mod health;
mod machine;
mod messages;
mod transport;

pub use client::{PushClient, PushHandle, RECONNECT_ACTION};
pub use dispatch::{dispatch, dispatch_frame, DispatchOutcome};
pub use health::{HealthCheck, HttpHealthCheck};
pub use machine::{backoff_delay, ConnectionMachine, FailureAction, ReconnectPolicy};
pub use messages::{decode, Decoded, InboundMessage, LruUpdate, OutboundMessage, TtlUpdate};
pub use transport::{Channel, Connector, InboundStream, OutboundSink, WsConnector};
