//! Push Transport
//!
//! The seam between the push client and the network: a `Connector` opens a
//! `Channel` made of an inbound text stream and an outbound text sink.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::error::ChannelError;

/// Inbound text frames; the stream ends when the peer closes.
pub type InboundStream = Pin<Box<dyn Stream<Item = Result<String, ChannelError>> + Send>>;

/// Outbound text frames.
pub type OutboundSink = Pin<Box<dyn Sink<String, Error = ChannelError> + Send>>;

/// An open duplex channel. Dropping it releases the connection.
pub struct Channel {
    pub inbound: InboundStream,
    pub outbound: OutboundSink,
}

impl Channel {
    pub fn new(inbound: InboundStream, outbound: OutboundSink) -> Self {
        Self { inbound, outbound }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Channel, ChannelError>;
}

// == WebSocket Connector ==
/// Opens the push channel over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Channel, ChannelError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        let (sink, stream) = ws.split();

        // Text frames only; the stream ends at the close frame.
        let inbound = stream
            .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(|frame| {
                future::ready(match frame {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(other) => {
                        debug!(kind = ?other, "Ignoring non-text push frame");
                        None
                    }
                    Err(err) => Some(Err(ChannelError::from(err))),
                })
            });

        let outbound = sink
            .sink_map_err(ChannelError::from)
            .with(|text: String| future::ready(Ok::<_, ChannelError>(Message::Text(text.into()))));

        Ok(Channel::new(Box::pin(inbound), Box::pin(outbound)))
    }
}
