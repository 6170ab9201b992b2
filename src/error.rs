//! Error types surfaced by mapping, configuration and delivery.

use std::io;

use thiserror::Error;

/// Errors returned while mapping or delivering a batch of metrics.
#[derive(Debug, Error)]
pub enum SyslogError {
    /// A header field could not be turned into a valid syslog header.
    #[error("cannot map metric to syslog message: {0}")]
    Mapping(String),
    /// The local hostname was needed as a fallback but could not be read.
    #[error("failed to resolve local hostname: {0}")]
    HostResolution(#[source] io::Error),
    /// Dialling the configured address failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },
    /// Sending a framed message failed; the connection has been dropped.
    #[error("failed to write syslog message: {0}")]
    Write(#[source] io::Error),
}

impl SyslogError {
    /// True for failures that left the output disconnected.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyslogError::Connect { .. } | SyslogError::Write(_))
    }
}

/// Errors raised while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid syslog output configuration: {0}")]
    InvalidConfig(String),
    /// The address could not be parsed into a transport.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
}
