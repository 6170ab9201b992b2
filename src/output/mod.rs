//! Syslog output: transports and the connection manager.
//!
//! This module defines [`SyslogOutput`], which maps metrics to RFC 5424
//! messages, frames them and writes them to a TCP, TLS, UDP or Unix socket.
//! Connections are established lazily and dropped on the first I/O failure;
//! the next write transparently dials again. There is no background retry
//! loop and no buffering: a failed batch is reported to the caller, who owns
//! the retry policy.

pub mod address;
mod config;
mod handler;
pub mod transport;

#[cfg(test)]
mod tests;

pub use address::{Address, Endpoint, Network};
pub use config::{
    DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_SDPARAM_SEPARATOR, SyslogConfig,
    TlsConfig,
};
pub use handler::SyslogOutput;
pub use transport::{ActiveConnection, Connection, Dialer, NetDialer, TlsOptions};
