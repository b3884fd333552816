//! Streaming subscription handle and its background socket task.
//!
//! Each subscription owns one WebSocket connection. A background task reads
//! inbound frames, JSON-decodes them, and forwards them through a bounded
//! channel to the [`Subscription`] handle. The task exits when the handle is
//! closed or dropped, when the consumer stops reading, or when the transport
//! ends and no redial interval is configured.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle for one streaming subscription.
///
/// Messages pushed by the gateway arrive through [`next`](Self::next).
/// Dropping the handle tears the connection down.
pub struct Subscription {
    id: Uuid,
    event_rx: mpsc::Receiver<Result<Value>>,
    close_tx: Option<oneshot::Sender<()>>,
    closed: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: Uuid,
        event_rx: mpsc::Receiver<Result<Value>>,
        close_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            id,
            event_rx,
            close_tx: Some(close_tx),
            closed: false,
        }
    }

    /// Identifier for this subscription, used in diagnostics.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receives the next message pushed by the gateway.
    ///
    /// Resolves once per inbound frame, in arrival order: `Some(Ok(_))` for
    /// each frame that decodes as JSON, `Some(Err(_))` for a frame that does
    /// not, or for a transport error. Returns `None` once the stream has
    /// ended.
    pub async fn next(&mut self) -> Option<Result<Value>> {
        match self.event_rx.recv().await {
            Some(item) => Some(item),
            None => {
                self.closed = true;
                None
            }
        }
    }

    /// Closes the subscription. The socket is shut down with a Close frame.
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
        self.closed = true;
    }

    /// Whether `close` was requested or the stream has ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

enum Exit {
    /// The handle asked for teardown (close or drop).
    Requested,
    /// The consumer side of the delivery channel is gone.
    ConsumerGone,
    /// The transport ended on its own.
    Transport,
}

/// Owns the socket for one subscription until it is torn down.
pub(crate) async fn run(
    mut ws: WsStream,
    url: String,
    frame: String,
    event_tx: mpsc::Sender<Result<Value>>,
    mut close_rx: oneshot::Receiver<()>,
    reconnect: Option<Duration>,
    id: Uuid,
) {
    loop {
        match pump(&mut ws, &event_tx, &mut close_rx).await {
            Exit::Requested => {
                let _ = ws.close(None).await;
                debug!(subscription = %id, "subscription closed");
                return;
            }
            Exit::ConsumerGone => {
                let _ = ws.close(None).await;
                return;
            }
            Exit::Transport => {
                let Some(interval) = reconnect else {
                    debug!(subscription = %id, "streaming connection ended");
                    return;
                };
                match redial(&url, &frame, interval, &mut close_rx, id).await {
                    Some(stream) => ws = stream,
                    None => return,
                }
            }
        }
    }
}

/// Forwards inbound frames until the connection ends or the handle closes.
async fn pump(
    ws: &mut WsStream,
    event_tx: &mpsc::Sender<Result<Value>>,
    close_rx: &mut oneshot::Receiver<()>,
) -> Exit {
    loop {
        tokio::select! {
            _ = &mut *close_rx => return Exit::Requested,
            msg = ws.next() => {
                let item = match msg {
                    Some(Ok(Message::Text(txt))) => {
                        serde_json::from_str(txt.as_str()).map_err(Error::from)
                    }
                    Some(Ok(Message::Binary(bin))) => {
                        serde_json::from_slice(&bin).map_err(Error::from)
                    }
                    Some(Ok(Message::Close(_))) | None => return Exit::Transport,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        if event_tx.send(Err(e.into())).await.is_err() {
                            return Exit::ConsumerGone;
                        }
                        return Exit::Transport;
                    }
                };
                if event_tx.send(item).await.is_err() {
                    return Exit::ConsumerGone;
                }
            }
        }
    }
}

/// Redials the streaming endpoint and replays the subscribe envelope.
/// Returns `None` if teardown was requested while waiting.
async fn redial(
    url: &str,
    frame: &str,
    interval: Duration,
    close_rx: &mut oneshot::Receiver<()>,
    id: Uuid,
) -> Option<WsStream> {
    loop {
        tokio::select! {
            _ = &mut *close_rx => return None,
            () = tokio::time::sleep(interval) => {}
        }
        match connect_async(url).await {
            Ok((mut stream, _)) => match stream.send(Message::Text(frame.to_owned().into())).await {
                Ok(()) => {
                    debug!(subscription = %id, "streaming connection reopened");
                    return Some(stream);
                }
                Err(e) => warn!(subscription = %id, error = %e, "redial handshake failed"),
            },
            Err(e) => warn!(subscription = %id, error = %e, "redial failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_subscription() -> (
        Subscription,
        mpsc::Sender<Result<Value>>,
        oneshot::Receiver<()>,
    ) {
        let (tx, rx) = mpsc::channel(4);
        let (close_tx, close_rx) = oneshot::channel();
        (Subscription::new(Uuid::new_v4(), rx, close_tx), tx, close_rx)
    }

    #[tokio::test]
    async fn next_drains_buffered_items_then_ends() {
        let (mut sub, tx, _close_rx) = test_subscription();
        tx.send(Ok(json!({"n": 1}))).await.unwrap();
        tx.send(Ok(json!({"n": 2}))).await.unwrap();
        drop(tx);

        assert_eq!(sub.next().await.unwrap().unwrap(), json!({"n": 1}));
        assert_eq!(sub.next().await.unwrap().unwrap(), json!({"n": 2}));
        assert!(sub.next().await.is_none());
        assert!(sub.is_closed());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_signals_the_task() {
        let (mut sub, _tx, mut close_rx) = test_subscription();
        assert!(!sub.is_closed());

        sub.close();
        sub.close();

        assert!(sub.is_closed());
        assert!(close_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn dropping_the_handle_signals_the_task() {
        let (sub, _tx, mut close_rx) = test_subscription();
        drop(sub);
        assert!(close_rx.try_recv().is_ok());
    }
}
