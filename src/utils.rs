//! Helpers for deriving gateway endpoint URLs.

use reqwest::Url;

use crate::error::{Error, Result};

/// Joins the one-shot call endpoint onto the gateway base URL.
pub fn call_url(base: &str) -> String {
    format!("{}/call", base.trim_end_matches('/'))
}

/// Derives the streaming endpoint from the gateway base URL: the scheme
/// flips to its WebSocket equivalent and the path is replaced by
/// `/streaming`.
pub fn streaming_url(base: &str) -> Result<String> {
    let mut url = Url::parse(base.trim())
        .map_err(|e| Error::Message(format!("invalid gateway URL '{}': {}", base, e)))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::Message(format!(
                "unsupported gateway URL scheme '{}'; expected http(s) or ws(s)",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::Message(format!("could not derive ws scheme for '{}'", base)))?;
    url.set_path("/streaming");
    Ok(url.to_string())
}
