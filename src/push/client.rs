//! Push Client
//!
//! Owns the single push-channel connection. The client runs as one task:
//! connect, pump frames into the store, back off and retry on loss, and
//! fall back to health polling once the attempts are exhausted.
//!
//! The reconnect timer lives inside the task and is dropped whenever a
//! command supersedes it, so a stale retry can never fire.

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::notifications::{NewNotification, NotificationAction};
use crate::push::dispatch::dispatch_frame;
use crate::push::health::HealthCheck;
use crate::push::machine::{ConnectionMachine, FailureAction, ReconnectPolicy};
use crate::push::transport::{Channel, Connector};
use crate::store::{ConnectionState, Store};

/// Action id carried by the "disabled" notification's button.
pub const RECONNECT_ACTION: &str = "connection.reconnect";

#[derive(Debug)]
enum Command {
    Send(String),
    Reconnect,
    Disconnect,
    Shutdown,
}

/// How a wait was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Nothing interrupted the wait
    Proceed,
    /// The machine was reset or disconnected; re-evaluate from the top
    Restart,
    Shutdown,
}

enum SessionEnd {
    /// The channel failed or the collector closed it
    Closed(String),
    Interrupted(Flow),
}

// == Push Handle ==
/// Cloneable control surface of a running push client.
#[derive(Debug, Clone)]
pub struct PushHandle {
    commands: mpsc::UnboundedSender<Command>,
    store: Store,
}

impl PushHandle {
    /// Sends a message if the channel is connected.
    ///
    /// Fire-and-forget: when not connected the message is dropped with a
    /// warning and `false` is returned. Nothing is ever queued for later.
    pub fn send<T: Serialize>(&self, message: &T) -> bool {
        let state = self.store.get_state().connection.state;
        if state != ConnectionState::Connected {
            warn!(?state, "Push channel not connected; outbound message dropped");
            return false;
        }
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "Outbound message could not be serialized");
                return false;
            }
        };
        self.commands.send(Command::Send(text)).is_ok()
    }

    /// Resets the attempt counter and connects again, from any state.
    pub fn reconnect(&self) -> bool {
        self.commands.send(Command::Reconnect).is_ok()
    }

    /// Cancels any pending retry, closes the channel and stays disconnected.
    pub fn disconnect(&self) -> bool {
        self.commands.send(Command::Disconnect).is_ok()
    }

    /// Stops the client task.
    pub fn shutdown(&self) -> bool {
        self.commands.send(Command::Shutdown).is_ok()
    }
}

// == Push Client ==
pub struct PushClient<C, H> {
    url: String,
    poll_interval: Duration,
    store: Store,
    connector: C,
    health: H,
    machine: ConnectionMachine,
}

impl<C: Connector, H: HealthCheck> PushClient<C, H> {
    pub fn new(config: &Config, store: Store, connector: C, health: H) -> Self {
        Self {
            url: config.ws_url.clone(),
            poll_interval: config.health_poll_interval(),
            store,
            connector,
            health,
            machine: ConnectionMachine::new(ReconnectPolicy::from_config(config)),
        }
    }

    /// Starts the client task; it begins connecting immediately.
    pub fn spawn(self) -> (PushHandle, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let handle = PushHandle {
            commands,
            store: self.store.clone(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!(url = %self.url, "Push client started");

        loop {
            if self.machine.is_idle() {
                publish(&self.store, &self.machine);
                let flow = if self.machine.state() == ConnectionState::Disabled {
                    self.poll_until_command(&mut commands).await
                } else {
                    wait_for_command(&mut commands, &mut self.machine).await
                };
                if flow == Flow::Shutdown {
                    break;
                }
                continue;
            }

            publish(&self.store, &self.machine);
            debug!(attempt = self.machine.attempts(), "Opening push channel");
            let opened = {
                let connect = self.connector.connect(&self.url);
                tokio::pin!(connect);
                loop {
                    tokio::select! {
                        result = &mut connect => break Ok(result),
                        cmd = commands.recv() => match handle_control(cmd, &mut self.machine) {
                            Flow::Proceed => continue,
                            flow => break Err(flow),
                        },
                    }
                }
            };

            let failure = match opened {
                Err(Flow::Shutdown) => break,
                Err(_) => continue,
                Ok(Ok(channel)) => {
                    self.machine.on_open();
                    self.store.mark_connected(Utc::now());
                    info!(url = %self.url, "Push channel connected");
                    self.store.notify(NewNotification::success(
                        "Connected",
                        "Real-time updates from the collector are live",
                    ));
                    match self.run_session(channel, &mut commands).await {
                        SessionEnd::Closed(reason) => reason,
                        SessionEnd::Interrupted(Flow::Shutdown) => break,
                        SessionEnd::Interrupted(_) => continue,
                    }
                }
                Ok(Err(err)) => err.to_string(),
            };

            warn!(error = %failure, attempts = self.machine.attempts(), "Push channel unavailable");
            self.store.record_connection_error(failure);

            match self.machine.on_failure() {
                FailureAction::Retry { delay } => {
                    publish(&self.store, &self.machine);
                    info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = self.machine.attempts() + 1,
                        "Scheduling reconnect"
                    );
                    match wait_retry(delay, &mut commands, &mut self.machine).await {
                        Flow::Proceed => self.machine.on_retry_elapsed(),
                        Flow::Restart => {}
                        Flow::Shutdown => break,
                    }
                }
                FailureAction::Disable => {
                    let attempts = self.machine.attempts();
                    warn!(attempts, "Reconnect attempts exhausted; falling back to polling");
                    self.store.notify(
                        NewNotification::error(
                            "Real-time updates disabled",
                            format!(
                                "The collector could not be reached after {} attempts. \
                                 Falling back to periodic health checks.",
                                attempts
                            ),
                        )
                        .with_action(NotificationAction::new("Reconnect", RECONNECT_ACTION)),
                    );
                }
            }
        }

        self.machine.disconnect();
        publish(&self.store, &self.machine);
        info!("Push client stopped");
    }

    /// Pumps one open channel until it closes or a command ends it.
    async fn run_session(
        &mut self,
        channel: Channel,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionEnd {
        let Channel {
            mut inbound,
            mut outbound,
        } = channel;

        let end = loop {
            tokio::select! {
                frame = inbound.next() => match frame {
                    Some(Ok(text)) => {
                        dispatch_frame(&self.store, &text);
                    }
                    Some(Err(err)) => break SessionEnd::Closed(err.to_string()),
                    None => break SessionEnd::Closed("channel closed by collector".to_string()),
                },
                cmd = commands.recv() => match cmd {
                    Some(Command::Send(text)) => {
                        if let Err(err) = outbound.send(text).await {
                            break SessionEnd::Closed(err.to_string());
                        }
                    }
                    other => match handle_control(other, &mut self.machine) {
                        Flow::Proceed => {}
                        flow => break SessionEnd::Interrupted(flow),
                    },
                },
            }
        };

        if let SessionEnd::Interrupted(_) = end {
            if let Err(err) = outbound.close().await {
                debug!(error = %err, "Push channel close failed");
            }
            info!("Push channel closed on request");
        }
        end
    }

    /// Fallback mode: poll the collector's health until told otherwise.
    async fn poll_until_command(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> Flow {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Commands still win while a poll is in flight.
                    let mut poll = self.health.is_reachable();
                    let reachable = loop {
                        tokio::select! {
                            reachable = &mut poll => break reachable,
                            cmd = commands.recv() => match handle_control(cmd, &mut self.machine) {
                                Flow::Proceed => {}
                                flow => return flow,
                            },
                        }
                    };
                    debug!(reachable, "Fallback health poll");
                    self.store.record_health(reachable, Utc::now());
                }
                cmd = commands.recv() => match handle_control(cmd, &mut self.machine) {
                    Flow::Proceed => {}
                    flow => return flow,
                },
            }
        }
    }
}

fn publish(store: &Store, machine: &ConnectionMachine) {
    store.set_connection_state(machine.state(), machine.attempts());
}

/// Applies a control command outside an open session.
fn handle_control(command: Option<Command>, machine: &mut ConnectionMachine) -> Flow {
    match command {
        Some(Command::Send(_)) => {
            warn!(state = ?machine.state(), "Push channel not connected; outbound message dropped");
            Flow::Proceed
        }
        Some(Command::Reconnect) => {
            info!("Reconnect requested");
            machine.restart();
            Flow::Restart
        }
        Some(Command::Disconnect) => {
            info!("Disconnect requested");
            machine.disconnect();
            Flow::Restart
        }
        Some(Command::Shutdown) | None => Flow::Shutdown,
    }
}

async fn wait_retry(
    delay: Duration,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    machine: &mut ConnectionMachine,
) -> Flow {
    let timer = tokio::time::sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = &mut timer => return Flow::Proceed,
            cmd = commands.recv() => match handle_control(cmd, machine) {
                Flow::Proceed => {}
                flow => return flow,
            },
        }
    }
}

async fn wait_for_command(
    commands: &mut mpsc::UnboundedReceiver<Command>,
    machine: &mut ConnectionMachine,
) -> Flow {
    loop {
        match handle_control(commands.recv().await, machine) {
            Flow::Proceed => {}
            flow => return flow,
        }
    }
}
