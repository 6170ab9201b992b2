//! Connection manager delivering framed syslog messages.

use std::io;

use log::{debug, warn};

use crate::{
    error::SyslogError,
    framing::{Framing, Trailer},
    mapper::SyslogMapper,
    metric::Metric,
};

use super::transport::{Connection, Dialer, NetDialer};

/// Connection lifecycle of a [`SyslogOutput`].
#[derive(Debug)]
enum ConnectionState<C> {
    Disconnected,
    Connected(C),
}

/// Maps metrics to syslog messages and writes them to a single connection.
///
/// The connection is dialled lazily: a failed or closed connection is only
/// re-established by the next [`connect`](Self::connect) or
/// [`write`](Self::write) call, never in the background.
pub struct SyslogOutput<D: Dialer = NetDialer> {
    mapper: SyslogMapper,
    framing: Framing,
    trailer: Trailer,
    dialer: D,
    state: ConnectionState<D::Connection>,
}

impl<D: Dialer> SyslogOutput<D> {
    /// Create a disconnected output.
    pub fn new(mapper: SyslogMapper, framing: Framing, trailer: Trailer, dialer: D) -> Self {
        Self {
            mapper,
            framing,
            trailer,
            dialer,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn mapper(&self) -> &SyslogMapper {
        &self.mapper
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Dial the configured destination, replacing any existing connection.
    pub fn connect(&mut self) -> Result<(), SyslogError> {
        self.close();
        let conn = self.dialer.dial().map_err(|source| {
            let address = self.dialer.target();
            warn!("syslog output failed to connect to {address}: {source}");
            SyslogError::Connect { address, source }
        })?;
        debug!("syslog output connected to {}", self.dialer.target());
        self.state = ConnectionState::Connected(conn);
        Ok(())
    }

    /// Map and frame a metric exactly as [`write`](Self::write) would send it.
    pub fn frame_metric(&self, metric: &Metric) -> Result<Vec<u8>, SyslogError> {
        let message = self.mapper.map(metric)?;
        Ok(crate::framing::frame(&message, self.framing, self.trailer))
    }

    /// Deliver `metrics` in order.
    ///
    /// The first failure aborts the rest of the batch and is returned. Dial
    /// and I/O failures leave the output disconnected; mapping failures leave
    /// the connection untouched.
    pub fn write(&mut self, metrics: &[Metric]) -> Result<(), SyslogError> {
        for metric in metrics {
            if !self.is_connected() {
                self.connect()?;
            }
            let frame = self.frame_metric(metric)?;
            self.send(&frame)?;
        }
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), SyslogError> {
        let ConnectionState::Connected(conn) = &mut self.state else {
            return Err(SyslogError::Write(io::Error::new(
                io::ErrorKind::NotConnected,
                "syslog output has no active connection",
            )));
        };
        if let Err(err) = conn.send(frame) {
            warn!(
                "syslog output write to {} failed: {err}",
                self.dialer.target()
            );
            self.close();
            return Err(SyslogError::Write(err));
        }
        Ok(())
    }

    /// Shut down and drop the current connection, if any.
    pub fn close(&mut self) {
        let ConnectionState::Connected(mut conn) =
            std::mem::replace(&mut self.state, ConnectionState::Disconnected)
        else {
            return;
        };
        match conn.shutdown() {
            Ok(()) => debug!("syslog output closed connection to {}", self.dialer.target()),
            Err(err) => debug!(
                "syslog output shutdown of {} reported: {err}",
                self.dialer.target()
            ),
        }
    }
}

impl<D: Dialer> Drop for SyslogOutput<D> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<D: Dialer> std::fmt::Debug for SyslogOutput<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogOutput")
            .field("target", &self.dialer.target())
            .field("framing", &self.framing)
            .field("trailer", &self.trailer)
            .field("connected", &self.is_connected())
            .finish()
    }
}
