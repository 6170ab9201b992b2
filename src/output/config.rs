//! Configuration consumed by the syslog output.
//!
//! `SyslogConfig` is deserialised from the host agent's configuration and
//! handed to [`SyslogOutputBuilder`](crate::builder::SyslogOutputBuilder),
//! which validates it before constructing a
//! [`SyslogOutput`](super::SyslogOutput).

use serde::Deserialize;

use crate::framing::{Framing, Trailer};
use crate::mapper::DEFAULT_APPNAME;

/// Default destination when none is configured.
pub const DEFAULT_ADDRESS: &str = "tcp://127.0.0.1:6514";
/// Default dial timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default separator between an SDID prefix and the parameter name.
pub const DEFAULT_SDPARAM_SEPARATOR: &str = "_";

/// TLS settings for TCP destinations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsConfig {
    /// Name verified against the server certificate; defaults to the host.
    pub domain: Option<String>,
    pub insecure_skip_verify: bool,
}

/// User-facing settings for the syslog output.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyslogConfig {
    pub address: String,
    pub framing: Framing,
    pub trailer: Trailer,
    pub default_sdid: String,
    pub sdids: Vec<String>,
    pub sdparam_separator: String,
    pub default_appname: String,
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: Option<u64>,
    pub tls: Option<TlsConfig>,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.into(),
            framing: Framing::default(),
            trailer: Trailer::default(),
            default_sdid: String::new(),
            sdids: Vec::new(),
            sdparam_separator: DEFAULT_SDPARAM_SEPARATOR.into(),
            default_appname: DEFAULT_APPNAME.into(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            write_timeout_ms: None,
            tls: None,
        }
    }
}
