//! # Gateway client
//!
//! Implements the three remote operations a bwproxy gateway exposes:
//!
//! - `query` — one-shot request/response over `POST /call`
//! - `publish` — one-shot request/response over `POST /call`
//! - `subscribe` — push stream over a WebSocket at `/streaming`
//!
//! Every operation wraps its parameters in an envelope `{key, proc, params}`
//! and dispatches it in a single attempt. The one-shot calls resolve to
//! exactly one success value or one error; a subscription delivers any
//! number of messages through its handle.

use futures::SinkExt;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{Error, Result},
    rpc::{Envelope, Proc},
    subscription::{self, Subscription},
    utils,
};

/// Client for a bwproxy gateway.
///
/// Construction performs no network activity. The key is stored as-is and
/// included verbatim in every envelope; the gateway resolves permissions
/// from it.
pub struct Client {
    /// Base URL of the gateway (e.g. "http://localhost:2222")
    base_url: String,
    /// Opaque API key
    key: String,
    /// Underlying HTTP client
    http: reqwest::Client,
    /// Configuration
    config: Config,
}

impl Client {
    /// Creates a new gateway client with default configuration.
    pub fn new<U: Into<String>, K: Into<String>>(base_url: U, key: K) -> Result<Self> {
        Self::with_config(base_url, key, Config::default())
    }

    /// Creates a new gateway client with custom configuration.
    pub fn with_config<U: Into<String>, K: Into<String>>(
        base_url: U,
        key: K,
        config: Config,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            http,
            config,
        })
    }

    /// The API key envelopes are stamped with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queries the gateway and returns the response payload.
    pub async fn query<P: Serialize>(&self, params: P) -> Result<Value> {
        self.call(Proc::Query, serde_json::to_value(params)?).await
    }

    /// Publishes through the gateway and returns the response payload.
    ///
    /// The gateway answers a successful publish with an empty body, which
    /// maps to `Value::Null`.
    pub async fn publish<P: Serialize>(&self, params: P) -> Result<Value> {
        self.call(Proc::Publish, serde_json::to_value(params)?).await
    }

    /// Sends one envelope to `POST /call` and decodes the reply.
    async fn call(&self, proc: Proc, params: Value) -> Result<Value> {
        let envelope = Envelope::new(self.key.as_str(), proc, params);
        let body = serde_json::to_string(&envelope)?;
        debug!("{} {}", proc, body);
        let resp = self
            .http
            .post(utils::call_url(&self.base_url))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Http { status, body: text });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Opens a streaming subscription.
    ///
    /// One WebSocket connection is opened per call and the subscribe
    /// envelope is sent as the sole outbound frame. Messages pushed by the
    /// gateway arrive through the returned [`Subscription`]; closing or
    /// dropping it tears the connection down.
    pub async fn subscribe<P: Serialize>(&self, params: P) -> Result<Subscription> {
        let envelope = Envelope::new(
            self.key.as_str(),
            Proc::Subscribe,
            serde_json::to_value(params)?,
        );
        let frame = serde_json::to_string(&envelope)?;
        let url = utils::streaming_url(&self.base_url)?;
        let id = Uuid::new_v4();
        debug!(subscription = %id, "{} {}", Proc::Subscribe, frame);

        let (mut ws, _) = connect_async(url.as_str()).await?;
        ws.send(Message::Text(frame.clone().into())).await?;

        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity);
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(subscription::run(
            ws,
            url,
            frame,
            event_tx,
            close_rx,
            self.config.reconnect_interval,
            id,
        ));
        Ok(Subscription::new(id, event_rx, close_tx))
    }
}
