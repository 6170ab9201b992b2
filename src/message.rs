//! In-memory representation of a single RFC 5424 syslog message.
//!
//! [`SyslogMessage`] renders to the one-line textual form through
//! [`Display`](std::fmt::Display):
//!
//! ```text
//! <PRI>VERSION TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA [MSG]
//! ```
//!
//! Absent optional header fields and empty structured data render as the nil
//! value `-`. The message body is only written, preceded by a single space,
//! when present.

use std::fmt::{self, Write};

use chrono::{DateTime, Timelike, Utc};

/// Nil value used for absent header fields.
pub const NILVALUE: &str = "-";

/// The only protocol version defined by RFC 5424.
pub const SYSLOG_VERSION: u16 = 1;

/// Highest valid PRI value (facility 23, severity 7).
pub const MAX_PRIORITY: u8 = 191;

/// A structured-data element: an SD-ID followed by its parameters.
///
/// Parameter values are stored unescaped; escaping happens on render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredElement {
    pub id: String,
    pub params: Vec<(String, String)>,
}

impl StructuredElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Vec::new(),
        }
    }
}

impl fmt::Display for StructuredElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.id)?;
        for (name, value) in &self.params {
            write!(f, " {name}=\"")?;
            write_escaped_param(f, value)?;
            f.write_char('"')?;
        }
        f.write_char(']')
    }
}

/// Backslash, double quote and right bracket are prefixed with a backslash.
fn write_escaped_param<W: Write>(out: &mut W, value: &str) -> fmt::Result {
    for c in value.chars() {
        if matches!(c, '\\' | '"' | ']') {
            out.write_char('\\')?;
        }
        out.write_char(c)?;
    }
    Ok(())
}

/// Format a timestamp as RFC 3339 UTC with at most microsecond precision.
///
/// Whole seconds carry no fraction; otherwise trailing zeros are trimmed.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    let mut out = ts.format("%Y-%m-%dT%H:%M:%S").to_string();
    let micros = ts.nanosecond() % 1_000_000_000 / 1_000;
    if micros > 0 {
        let frac = format!("{micros:06}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

/// RFC 5424 syslog message assembled from a metric.
#[derive(Clone, Debug, PartialEq)]
pub struct SyslogMessage {
    pub priority: u8,
    pub version: u16,
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub app_name: String,
    pub proc_id: Option<String>,
    pub msg_id: Option<String>,
    pub structured_data: Vec<StructuredElement>,
    pub message: Option<String>,
}

impl SyslogMessage {
    /// Render the message to its one-line RFC 5424 form.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SyslogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}>{} {} {} {} {} {} ",
            self.priority,
            self.version,
            format_timestamp(&self.timestamp),
            nil_if_empty(&self.hostname),
            nil_if_empty(&self.app_name),
            self.proc_id.as_deref().map_or(NILVALUE, nil_if_empty),
            self.msg_id.as_deref().map_or(NILVALUE, nil_if_empty),
        )?;
        if self.structured_data.is_empty() {
            f.write_str(NILVALUE)?;
        } else {
            for element in &self.structured_data {
                write!(f, "{element}")?;
            }
        }
        match self.message.as_deref() {
            Some(msg) if !msg.is_empty() => write!(f, " {msg}"),
            _ => Ok(()),
        }
    }
}

fn nil_if_empty(value: &str) -> &str {
    if value.is_empty() { NILVALUE } else { value }
}
