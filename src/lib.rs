//! # bwproxy client
//!
//! This crate is a Rust client library for a bwproxy message gateway. Every
//! remote operation is described by a JSON envelope `{key, proc, params}`,
//! where `key` is an opaque credential supplied at construction and included
//! verbatim. It supports:
//!
//! - Queries (one-shot request/response over `POST /call`)
//! - Publishes (one-shot request/response over `POST /call`)
//! - Streaming subscriptions over a WebSocket at `/streaming`, delivered
//!   through a disposable subscription handle
//!
//! For usage examples, see `demos/simple.rs`.

pub mod client;
pub mod config;
pub mod error;
pub mod rpc;
pub mod subscription;
pub mod utils;
