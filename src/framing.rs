//! Message framing for syslog transports (RFC 6587).
//!
//! Framing is chosen purely from configuration. Stream receivers normally
//! expect octet counting while datagram receivers accept non-transparent
//! frames, but no pairing is enforced here.

use std::fmt;

use serde::Deserialize;

use crate::message::SyslogMessage;

/// How messages are delimited on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Prefix each message with its decimal byte length and a space.
    #[default]
    #[serde(alias = "OctetCounting")]
    OctetCounting,
    /// Terminate each message with a trailer byte.
    #[serde(alias = "NonTransparent")]
    NonTransparent,
}

/// Trailer byte appended by [`Framing::NonTransparent`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trailer {
    #[default]
    #[serde(alias = "NUL")]
    Nul,
    #[serde(alias = "LF")]
    Lf,
}

impl Trailer {
    pub fn as_byte(self) -> u8 {
        match self {
            Trailer::Nul => 0x00,
            Trailer::Lf => b'\n',
        }
    }
}

impl Framing {
    /// Frame an already rendered syslog line.
    pub fn frame_line(self, line: &str, trailer: Trailer) -> Vec<u8> {
        match self {
            Framing::OctetCounting => {
                let prefix = format!("{} ", line.len());
                let mut framed = Vec::with_capacity(prefix.len() + line.len());
                framed.extend_from_slice(prefix.as_bytes());
                framed.extend_from_slice(line.as_bytes());
                framed
            }
            Framing::NonTransparent => {
                let mut framed = Vec::with_capacity(line.len() + 1);
                framed.extend_from_slice(line.as_bytes());
                framed.push(trailer.as_byte());
                framed
            }
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Framing::OctetCounting => "octet-counting",
            Framing::NonTransparent => "non-transparent",
        })
    }
}

/// Serialise `message` and frame it for the wire.
pub fn frame(message: &SyslogMessage, framing: Framing, trailer: Trailer) -> Vec<u8> {
    framing.frame_line(&message.to_line(), trailer)
}
