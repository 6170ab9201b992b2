//! Map metrics onto RFC 5424 syslog messages.
//!
//! [`SyslogMapper`] classifies a metric's fields (see [`classifier`]), turns
//! the recognised header fields into validated header values and fills the
//! gaps with defaults: PRI `0`, the injected host identity for the hostname,
//! the configured default app-name, and the metric name as MSGID.

pub mod classifier;
pub mod host;

use std::sync::Arc;

use log::debug;

use crate::error::SyslogError;
use crate::message::{MAX_PRIORITY, SYSLOG_VERSION, SyslogMessage};
use crate::metric::{FieldValue, Metric};

pub use classifier::{Classified, HeaderField, HeaderFields, SdidConfig, classify};
pub use host::{HostIdentity, StaticHost, SystemHost};

/// App-name written when a metric does not carry one.
pub const DEFAULT_APPNAME: &str = "Telegraf";

const MAX_HOSTNAME_LEN: usize = 255;
const MAX_APPNAME_LEN: usize = 48;
const MAX_PROCID_LEN: usize = 128;
const MAX_MSGID_LEN: usize = 32;

/// Converts metrics into [`SyslogMessage`] values.
#[derive(Clone)]
pub struct SyslogMapper {
    sd: SdidConfig,
    default_appname: String,
    host: Arc<dyn HostIdentity>,
}

impl SyslogMapper {
    /// Create a mapper that resolves the fallback hostname from the OS.
    pub fn new(sd: SdidConfig) -> Self {
        Self::with_host(sd, SystemHost)
    }

    /// Create a mapper with an explicit host identity provider.
    pub fn with_host<H>(sd: SdidConfig, host: H) -> Self
    where
        H: HostIdentity + 'static,
    {
        Self {
            sd,
            default_appname: DEFAULT_APPNAME.into(),
            host: Arc::new(host),
        }
    }

    /// Override the app-name used when a metric carries none.
    pub fn with_default_appname(mut self, appname: impl Into<String>) -> Self {
        self.default_appname = appname.into();
        self
    }

    pub fn sdid_config(&self) -> &SdidConfig {
        &self.sd
    }

    /// Build the syslog message for `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`SyslogError::Mapping`] when a header field holds a value that
    /// cannot be represented in the RFC 5424 header, and
    /// [`SyslogError::HostResolution`] when the hostname fallback fails.
    pub fn map(&self, metric: &Metric) -> Result<SyslogMessage, SyslogError> {
        let Classified {
            headers,
            structured_data,
        } = classify(metric.fields(), &self.sd);

        let priority = headers.pri.map(parse_priority).transpose()?.unwrap_or(0);
        let hostname = match headers.hostname {
            Some(value) => header_value("HOSTNAME", value, MAX_HOSTNAME_LEN)?,
            None => {
                let local = self.host.hostname().map_err(SyslogError::HostResolution)?;
                validate_header("HOSTNAME", local, MAX_HOSTNAME_LEN)?
            }
        };
        let app_name = match headers.app_name {
            Some(value) => header_value("APP-NAME", value, MAX_APPNAME_LEN)?,
            None => self.default_appname.clone(),
        };
        let proc_id = headers
            .proc_id
            .map(|value| header_value("PROCID", value, MAX_PROCID_LEN))
            .transpose()?;
        let msg_id = match headers.msg_id {
            Some(value) => header_value("MSGID", value, MAX_MSGID_LEN)?,
            None => metric.name().to_owned(),
        };

        Ok(SyslogMessage {
            priority,
            version: SYSLOG_VERSION,
            timestamp: metric.timestamp(),
            hostname,
            app_name,
            proc_id,
            msg_id: Some(msg_id),
            structured_data,
            message: headers.msg.map(ToString::to_string),
        })
    }
}

impl std::fmt::Debug for SyslogMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogMapper")
            .field("sd", &self.sd)
            .field("default_appname", &self.default_appname)
            .finish_non_exhaustive()
    }
}

/// Non-negative integers above [`MAX_PRIORITY`] fall back to `0`.
fn parse_priority(value: &FieldValue) -> Result<u8, SyslogError> {
    let pri = value.as_u64().ok_or_else(|| {
        SyslogError::Mapping(format!(
            "PRI must be a non-negative integer, got {value:?}"
        ))
    })?;
    match u8::try_from(pri) {
        Ok(pri) if pri <= MAX_PRIORITY => Ok(pri),
        _ => {
            debug!("PRI {pri} exceeds {MAX_PRIORITY}, using 0");
            Ok(0)
        }
    }
}

fn header_value(name: &str, value: &FieldValue, max_len: usize) -> Result<String, SyslogError> {
    validate_header(name, value.to_string(), max_len)
}

/// Header values must be non-empty printable US-ASCII within `max_len`.
fn validate_header(name: &str, rendered: String, max_len: usize) -> Result<String, SyslogError> {
    if rendered.is_empty() {
        return Err(SyslogError::Mapping(format!("{name} must not be empty")));
    }
    if rendered.len() > max_len {
        return Err(SyslogError::Mapping(format!(
            "{name} exceeds {max_len} characters: {rendered:?}"
        )));
    }
    if !rendered.bytes().all(|b| (33..=126).contains(&b)) {
        return Err(SyslogError::Mapping(format!(
            "{name} must be printable US-ASCII without spaces: {rendered:?}"
        )));
    }
    Ok(rendered)
}
