//! Integration Tests for the Push Client
//!
//! Drives the client through scripted connectors on a paused clock, so the
//! backoff schedule can be checked in virtual time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{sink, stream};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_test::assert_ok;

use kvscope::push::{
    Channel, Connector, HealthCheck, InboundStream, OutboundMessage, OutboundSink, PushClient,
    RECONNECT_ACTION,
};
use kvscope::{ChannelError, Config, ConnectionState, Store};

// == Fakes ==

/// The collector's end of a fake channel.
struct Peer {
    frames: mpsc::UnboundedSender<Result<String, ChannelError>>,
    sent: mpsc::UnboundedReceiver<String>,
}

fn channel_pair() -> (Channel, Peer) {
    let (frames, frames_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent) = mpsc::unbounded_channel::<String>();

    let inbound: InboundStream = Box::pin(stream::unfold(frames_rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    }));
    let outbound: OutboundSink = Box::pin(sink::unfold(sent_tx, |tx, text: String| async move {
        tx.send(text)
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok::<_, ChannelError>(tx)
    }));

    (Channel::new(inbound, outbound), Peer { frames, sent })
}

#[derive(Default)]
struct Script {
    /// One entry per connect call; `None` or an exhausted script fails
    outcomes: Mutex<VecDeque<Option<Channel>>>,
    attempts: Mutex<Vec<Instant>>,
}

#[derive(Clone, Default)]
struct ScriptedConnector(Arc<Script>);

impl ScriptedConnector {
    fn failing() -> Self {
        Self::default()
    }

    fn with(outcomes: Vec<Option<Channel>>) -> Self {
        let connector = Self::default();
        *connector.0.outcomes.lock() = outcomes.into();
        connector
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.0.attempts.lock().clone()
    }

    fn calls(&self) -> usize {
        self.0.attempts.lock().len()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<Channel, ChannelError> {
        self.0.attempts.lock().push(Instant::now());
        let next = self.0.outcomes.lock().pop_front().flatten();
        next.ok_or_else(|| ChannelError::Connect("connection refused".to_string()))
    }
}

#[derive(Clone)]
struct FakeHealth {
    reachable: Arc<AtomicBool>,
    polls: Arc<AtomicUsize>,
}

impl FakeHealth {
    fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl HealthCheck for FakeHealth {
    async fn is_reachable(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.reachable.load(Ordering::SeqCst)
    }
}

/// Health check that answers only after a long stall.
#[derive(Clone, Default)]
struct StalledHealth {
    started: Arc<AtomicUsize>,
}

#[async_trait]
impl HealthCheck for StalledHealth {
    async fn is_reachable(&self) -> bool {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        true
    }
}

// == Helper Functions ==

fn config() -> Config {
    Config {
        ws_url: "ws://collector.test/ws".to_string(),
        ..Config::default()
    }
}

fn store() -> Store {
    Store::new(5, Duration::from_secs(2)).unwrap()
}

async fn wait_for_state(store: &Store, expected: ConnectionState) {
    let mut states = store.watch(|s| s.connection.state);
    states.wait_for(|s| *s == expected).await.unwrap();
}

fn gaps_ms(times: &[Instant]) -> Vec<u64> {
    times
        .windows(2)
        .map(|w| (w[1] - w[0]).as_millis() as u64)
        .collect()
}

fn assert_gaps(actual: &[u64], expected: &[u64]) {
    assert_eq!(actual.len(), expected.len(), "gaps: {:?}", actual);
    for (got, want) in actual.iter().zip(expected) {
        assert!(
            *got >= *want && *got - *want < 5,
            "expected ~{}ms, got {}ms (all: {:?})",
            want,
            got,
            actual
        );
    }
}

// == Backoff Tests ==

#[tokio::test(start_paused = true)]
async fn test_failures_back_off_then_disable() {
    let store = store();
    let connector = ScriptedConnector::failing();
    let (handle, task) =
        PushClient::new(&config(), store.clone(), connector.clone(), FakeHealth::new(false)).spawn();

    wait_for_state(&store, ConnectionState::Disabled).await;

    // Initial attempt plus five retries
    assert_eq!(connector.calls(), 6);
    assert_gaps(
        &gaps_ms(&connector.attempt_times()),
        &[1000, 2000, 4000, 8000, 16_000],
    );

    let state = store.get_state();
    assert_eq!(state.connection.attempts, 5);
    assert!(state
        .connection
        .last_error
        .as_deref()
        .unwrap()
        .contains("connection refused"));

    let disabled = state
        .notifications
        .all()
        .iter()
        .find(|n| n.title == "Real-time updates disabled")
        .expect("disabled notification");
    assert_eq!(disabled.actions[0].action, RECONNECT_ACTION);

    handle.shutdown();
    assert_ok!(task.await);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_client_polls_health() {
    let store = store();
    let health = FakeHealth::new(true);
    let config = Config {
        max_reconnect_attempts: 0,
        ..config()
    };
    let (handle, task) =
        PushClient::new(&config, store.clone(), ScriptedConnector::failing(), health.clone())
            .spawn();

    let mut polled = store.watch(|s| s.connection.collector_reachable);
    assert_eq!(polled.wait_for(|r| r.is_some()).await.unwrap(), Some(true));

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert!(health.polls.load(Ordering::SeqCst) >= 3);
    assert_eq!(store.get_state().connection.state, ConnectionState::Disabled);

    handle.shutdown();
    assert_ok!(task.await);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_from_disabled_resets_attempts() {
    let store = store();
    let (channel, _peer) = channel_pair();
    let connector = ScriptedConnector::with(vec![None, None, Some(channel)]);
    let config = Config {
        max_reconnect_attempts: 1,
        ..config()
    };
    let (handle, _task) =
        PushClient::new(&config, store.clone(), connector.clone(), FakeHealth::new(false)).spawn();

    wait_for_state(&store, ConnectionState::Disabled).await;
    assert_eq!(store.get_state().connection.attempts, 1);

    assert!(handle.reconnect());
    wait_for_state(&store, ConnectionState::Connected).await;

    let state = store.get_state();
    assert_eq!(state.connection.attempts, 0);
    assert!(state.connection.last_connected_at.is_some());
    assert_eq!(connector.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_interrupts_pending_health_check() {
    let store = store();
    let health = StalledHealth::default();
    let (channel, _peer) = channel_pair();
    let connector = ScriptedConnector::with(vec![None, Some(channel)]);
    let config = Config {
        max_reconnect_attempts: 0,
        ..config()
    };
    let (handle, task) =
        PushClient::new(&config, store.clone(), connector.clone(), health.clone()).spawn();

    wait_for_state(&store, ConnectionState::Disabled).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(health.started.load(Ordering::SeqCst), 1);
    assert_eq!(store.get_state().connection.collector_reachable, None);

    let requested = Instant::now();
    assert!(handle.reconnect());
    wait_for_state(&store, ConnectionState::Connected).await;

    assert!(requested.elapsed() < Duration::from_secs(5), "{:?}", requested.elapsed());
    assert_eq!(connector.calls(), 2);

    handle.shutdown();
    assert_ok!(task.await);
}

// == Session Tests ==

#[tokio::test(start_paused = true)]
async fn test_connected_channel_dispatches_and_sends() {
    let store = store();
    let (channel, mut peer) = channel_pair();
    let (handle, _task) = PushClient::new(
        &config(),
        store.clone(),
        ScriptedConnector::with(vec![Some(channel)]),
        FakeHealth::new(true),
    )
    .spawn();

    wait_for_state(&store, ConnectionState::Connected).await;
    assert!(store
        .get_state()
        .notifications
        .all()
        .iter()
        .any(|n| n.title == "Connected"));

    assert!(handle.send(&OutboundMessage::new("ping", json!({ "n": 1 }))));
    let frame: Value = serde_json::from_str(&peer.sent.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "ping");
    assert_eq!(frame["data"]["n"], 1);
    assert!(frame.get("timestamp").is_some());

    let mut lru = store.watch(|s| s.lru.len());
    peer.frames
        .send(Ok(r#"{"type":"mystery","data":{}}"#.to_string()))
        .unwrap();
    peer.frames.send(Ok("{broken".to_string())).unwrap();
    peer.frames
        .send(Ok(
            r#"{"type":"lruUpdate","data":{"action":"touch","key":"remote","value":"1"}}"#
                .to_string(),
        ))
        .unwrap();
    lru.wait_for(|len| *len == 1).await.unwrap();

    let state = store.get_state();
    assert_eq!(state.lru.get("remote").unwrap().value, "1");
    assert_eq!(state.connection.state, ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_lost_channel_reconnects_after_backoff() {
    let store = store();
    let (first, peer) = channel_pair();
    let (second, _second_peer) = channel_pair();
    let connector = ScriptedConnector::with(vec![Some(first), Some(second)]);
    let (_handle, _task) =
        PushClient::new(&config(), store.clone(), connector.clone(), FakeHealth::new(false))
            .spawn();

    wait_for_state(&store, ConnectionState::Connected).await;
    drop(peer);

    wait_for_state(&store, ConnectionState::Reconnecting).await;
    assert!(store
        .get_state()
        .connection
        .last_error
        .as_deref()
        .unwrap()
        .contains("closed"));

    wait_for_state(&store, ConnectionState::Connected).await;
    assert_eq!(connector.calls(), 2);
    assert_gaps(&gaps_ms(&connector.attempt_times()), &[1000]);
    assert_eq!(store.get_state().connection.attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_ends_session() {
    let store = store();
    let (channel, peer) = channel_pair();
    let (_handle, _task) = PushClient::new(
        &config(),
        store.clone(),
        ScriptedConnector::with(vec![Some(channel)]),
        FakeHealth::new(false),
    )
    .spawn();

    wait_for_state(&store, ConnectionState::Connected).await;
    peer.frames
        .send(Err(ChannelError::Transport("reset by peer".to_string())))
        .unwrap();

    wait_for_state(&store, ConnectionState::Reconnecting).await;
    assert!(store
        .get_state()
        .connection
        .last_error
        .as_deref()
        .unwrap()
        .contains("reset by peer"));
}

// == Control Tests ==

#[tokio::test(start_paused = true)]
async fn test_send_while_not_connected_is_dropped() {
    let store = store();
    let (handle, _task) = PushClient::new(
        &config(),
        store.clone(),
        ScriptedConnector::failing(),
        FakeHealth::new(false),
    )
    .spawn();

    wait_for_state(&store, ConnectionState::Reconnecting).await;
    assert!(!handle.send(&json!({ "type": "ping" })));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_retry() {
    let store = store();
    let connector = ScriptedConnector::failing();
    let (handle, _task) =
        PushClient::new(&config(), store.clone(), connector.clone(), FakeHealth::new(false))
            .spawn();

    wait_for_state(&store, ConnectionState::Reconnecting).await;
    assert!(handle.disconnect());
    wait_for_state(&store, ConnectionState::Disconnected).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.calls(), 1);

    assert!(handle.reconnect());
    wait_for_state(&store, ConnectionState::Reconnecting).await;
    assert_eq!(connector.calls(), 2);
    assert_eq!(store.get_state().connection.attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_open_channel() {
    let store = store();
    let (channel, mut peer) = channel_pair();
    let connector = ScriptedConnector::with(vec![Some(channel)]);
    let (handle, _task) =
        PushClient::new(&config(), store.clone(), connector.clone(), FakeHealth::new(false))
            .spawn();

    wait_for_state(&store, ConnectionState::Connected).await;
    assert!(handle.disconnect());
    wait_for_state(&store, ConnectionState::Disconnected).await;

    // The client released its end of the channel
    assert!(peer.sent.recv().await.is_none());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_task() {
    let store = store();
    let (handle, task) = PushClient::new(
        &config(),
        store.clone(),
        ScriptedConnector::failing(),
        FakeHealth::new(false),
    )
    .spawn();

    wait_for_state(&store, ConnectionState::Reconnecting).await;
    assert!(handle.shutdown());
    assert_ok!(task.await);

    assert_eq!(store.get_state().connection.state, ConnectionState::Disconnected);
    assert!(!handle.reconnect());
}
