//! Wire types for gateway RPC calls.
//!
//! Every remote operation is described by an [`Envelope`]: the caller's API
//! key, a procedure selector, and a procedure-specific parameter object.
//! `query` and `publish` envelopes go out as the body of a `POST /call`;
//! `subscribe` envelopes are the first frame on a `/streaming` WebSocket.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Procedure selector carried in the `proc` field of every envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proc {
    Query,
    Publish,
    Subscribe,
}

impl fmt::Display for Proc {
    /// Uppercase tag used in diagnostics, e.g. `QUERY`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Proc::Query => "QUERY",
            Proc::Publish => "PUBLISH",
            Proc::Subscribe => "SUBSCRIBE",
        };
        write!(f, "{}", tag)
    }
}

/// The request object sent to the gateway.
///
/// Built fresh for each call and never stored. The gateway resolves the
/// caller's permissions from `key`; `params` is passed through opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub key: String,
    pub proc: Proc,
    pub params: Value,
}

impl Envelope {
    pub fn new(key: impl Into<String>, proc: Proc, params: Value) -> Self {
        Self {
            key: key.into(),
            proc,
            params,
        }
    }
}

/// Parameters understood by the gateway's `query` procedure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Resource URI to query.
    pub uri: String,
    /// Restrict results to payload objects of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponum: Option<String>,
}

impl QueryParams {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ponum: None,
        }
    }

    pub fn with_ponum(mut self, ponum: impl Into<String>) -> Self {
        self.ponum = Some(ponum.into());
        self
    }
}

/// Parameters understood by the gateway's `publish` procedure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishParams {
    /// Resource URI to publish on.
    pub uri: String,
    /// Payload object type of `contents`.
    pub ponum: String,
    pub contents: Value,
    /// Ask the gateway to persist the message on the URI.
    #[serde(default)]
    pub persist: bool,
}

impl PublishParams {
    pub fn new(uri: impl Into<String>, ponum: impl Into<String>, contents: Value) -> Self {
        Self {
            uri: uri.into(),
            ponum: ponum.into(),
            contents,
            persist: false,
        }
    }

    pub fn persist(mut self) -> Self {
        self.persist = true;
        self
    }
}

/// Parameters understood by the gateway's `subscribe` procedure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscribeParams {
    /// Resource URI to subscribe to.
    pub uri: String,
    /// Restrict delivery to payload objects of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponum: Option<String>,
}

impl SubscribeParams {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ponum: None,
        }
    }

    pub fn with_ponum(mut self, ponum: impl Into<String>) -> Self {
        self.ponum = Some(ponum.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_matches_wire_shape() {
        let envelope = Envelope::new("K1", Proc::Query, json!({"q": "a"}));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"key": "K1", "proc": "query", "params": {"q": "a"}})
        );
    }

    #[test]
    fn proc_serializes_to_lowercase_literals() {
        assert_eq!(serde_json::to_value(Proc::Query).unwrap(), json!("query"));
        assert_eq!(serde_json::to_value(Proc::Publish).unwrap(), json!("publish"));
        assert_eq!(
            serde_json::to_value(Proc::Subscribe).unwrap(),
            json!("subscribe")
        );
    }

    #[test]
    fn proc_displays_as_uppercase_tag() {
        assert_eq!(Proc::Query.to_string(), "QUERY");
        assert_eq!(Proc::Subscribe.to_string(), "SUBSCRIBE");
    }

    #[test]
    fn optional_ponum_is_omitted_from_the_wire() {
        assert_eq!(
            serde_json::to_value(QueryParams::new("a/b/c")).unwrap(),
            json!({"uri": "a/b/c"})
        );
        assert_eq!(
            serde_json::to_value(QueryParams::new("a/b/c").with_ponum("2.0.0.0")).unwrap(),
            json!({"uri": "a/b/c", "ponum": "2.0.0.0"})
        );
    }

    #[test]
    fn publish_params_carry_contents_and_persist() {
        let params = PublishParams::new("a/b", "2.0.0.0", json!({"msg": "hi"})).persist();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "uri": "a/b",
                "ponum": "2.0.0.0",
                "contents": {"msg": "hi"},
                "persist": true
            })
        );
    }

    #[test]
    fn envelope_round_trips_through_the_gateway_decoder() {
        let wire = r#"{"key":"K1","proc":"subscribe","params":{"uri":"a/b/*"}}"#;
        let decoded: Envelope = serde_json::from_str(wire).unwrap();
        assert_eq!(decoded.proc, Proc::Subscribe);
        assert_eq!(decoded.key, "K1");
        assert_eq!(decoded.params, json!({"uri": "a/b/*"}));
    }
}
