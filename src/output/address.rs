//! Parsing of `scheme://host:port` output addresses.
//!
//! The scheme selects the transport: `tcp`, `tcp4`, `tcp6`, `udp`, `udp4`,
//! `udp6`, or, for local sockets, `unix` and `unixgram` followed by a path
//! (`unix:///run/syslog.sock`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Network family named by the address scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
    Unix,
    Unixgram,
}

/// IP version restriction applied when resolving a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpVersion {
    Any,
    V4,
    V6,
}

impl Network {
    fn from_scheme(scheme: &str) -> Option<Self> {
        let network = match scheme.to_ascii_lowercase().as_str() {
            "tcp" => Network::Tcp,
            "tcp4" => Network::Tcp4,
            "tcp6" => Network::Tcp6,
            "udp" => Network::Udp,
            "udp4" => Network::Udp4,
            "udp6" => Network::Udp6,
            "unix" => Network::Unix,
            "unixgram" => Network::Unixgram,
            _ => return None,
        };
        Some(network)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
            Network::Unix => "unix",
            Network::Unixgram => "unixgram",
        }
    }

    /// True for connection-oriented byte-stream transports.
    pub fn is_stream(self) -> bool {
        matches!(
            self,
            Network::Tcp | Network::Tcp4 | Network::Tcp6 | Network::Unix
        )
    }

    pub fn is_local(self) -> bool {
        matches!(self, Network::Unix | Network::Unixgram)
    }

    pub fn ip_version(self) -> IpVersion {
        match self {
            Network::Tcp4 | Network::Udp4 => IpVersion::V4,
            Network::Tcp6 | Network::Udp6 => IpVersion::V6,
            _ => IpVersion::Any,
        }
    }
}

/// Where the transport connects to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Host { host: String, port: u16 },
    Path(PathBuf),
}

/// Parsed output address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub network: Network,
    pub endpoint: Endpoint,
}

impl FromStr for Address {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidAddress {
            address: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let (scheme, rest) = raw
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("expected scheme://host:port"))?;
        let network = Network::from_scheme(scheme)
            .ok_or_else(|| invalid(&format!("unsupported scheme {scheme:?}")))?;

        if network.is_local() {
            if rest.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(Self {
                network,
                endpoint: Endpoint::Path(PathBuf::from(rest)),
            });
        }

        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid(&format!("invalid port {port:?}")))?;

        Ok(Self {
            network,
            endpoint: Endpoint::Host {
                host: host.to_owned(),
                port,
            },
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Endpoint::Host { host, port } if host.contains(':') => {
                write!(f, "{}://[{host}]:{port}", self.network.as_str())
            }
            Endpoint::Host { host, port } => write!(f, "{}://{host}:{port}", self.network.as_str()),
            Endpoint::Path(path) => write!(f, "{}://{}", self.network.as_str(), path.display()),
        }
    }
}
