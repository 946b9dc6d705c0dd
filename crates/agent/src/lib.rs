//! `nsca-agent` library crate.
//!
//! NSCA-ng session client, PSK-TLS transport, metric router and the host
//! collector. The binary entrypoint lives in `main.rs`.

pub mod collector;
pub mod config;
pub mod error;
pub mod router;
pub mod sender;
pub mod session;
pub mod transport;
