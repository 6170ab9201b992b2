//! Convert metrics into RFC 5424 syslog messages and deliver them.
//!
//! The pipeline has three stages:
//!
//! - [`mapper`] classifies a metric's fields into header values and
//!   structured-data parameters and builds a [`SyslogMessage`].
//! - [`framing`] serialises the message and frames it per RFC 6587.
//! - [`output`] owns the single outbound connection, dialling lazily and
//!   dropping it on the first I/O failure.
//!
//! [`SyslogOutputBuilder`] validates a [`SyslogConfig`] and wires the stages
//! together.

pub mod builder;
pub mod error;
pub mod framing;
pub mod mapper;
pub mod message;
pub mod metric;
pub mod output;

#[cfg(test)]
mod test_utils;

pub use builder::SyslogOutputBuilder;
pub use error::{ConfigError, SyslogError};
pub use framing::{Framing, Trailer, frame};
pub use mapper::{HostIdentity, SdidConfig, StaticHost, SyslogMapper, SystemHost};
pub use message::{StructuredElement, SyslogMessage};
pub use metric::{FieldValue, Metric};
pub use output::{
    Address, Connection, Dialer, NetDialer, SyslogConfig, SyslogOutput, TlsConfig, TlsOptions,
};
