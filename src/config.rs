//! Configuration options for the gateway client.

use std::time::Duration;

/// Configuration for the gateway client.
///
/// The defaults keep calls single-shot and unbounded: no HTTP timeout and
/// no redial of a dropped streaming connection.
#[derive(Clone, Debug)]
pub struct Config {
    /// Optional timeout for HTTP requests.
    pub timeout: Option<Duration>,
    /// Redial interval for a dropped streaming connection. `None` never
    /// reopens the connection.
    pub reconnect_interval: Option<Duration>,
    /// Capacity of each subscription's delivery channel.
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: None,
            reconnect_interval: None,
            channel_capacity: 64,
        }
    }
}
