//! Host identity providers used for the hostname fallback.

use std::io;

/// Supplies the hostname written when a metric carries none.
pub trait HostIdentity: Send + Sync {
    /// Return the local hostname.
    fn hostname(&self) -> io::Result<String>;
}

/// Reads the hostname from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHost;

impl HostIdentity for SystemHost {
    fn hostname(&self) -> io::Result<String> {
        hostname::get()?.into_string().map_err(|raw| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("hostname {raw:?} is not valid UTF-8"),
            )
        })
    }
}

/// Always reports the same hostname.
#[derive(Clone, Debug)]
pub struct StaticHost(pub String);

impl StaticHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostIdentity for StaticHost {
    fn hostname(&self) -> io::Result<String> {
        Ok(self.0.clone())
    }
}
