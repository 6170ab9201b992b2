//! A dialer that records every frame it is asked to deliver.
//!
//! Failures can be injected for the next dial or the next send so tests can
//! drive the connection state machine through its error paths.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::output::{Connection, Dialer};

#[derive(Default)]
struct Shared {
    frames: Vec<Vec<u8>>,
    dials: usize,
    shutdowns: usize,
    fail_dials: usize,
    fail_sends: usize,
}

/// Dialer handing out connections backed by a shared in-memory log.
#[derive(Clone, Default)]
pub struct RecordingDialer {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` dial attempts fail.
    pub fn fail_next_dials(&self, count: usize) {
        self.shared.lock().fail_dials = count;
    }

    /// Make the next `count` sends fail.
    pub fn fail_next_sends(&self, count: usize) {
        self.shared.lock().fail_sends = count;
    }

    /// Snapshot of every frame delivered so far.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.shared.lock().frames.clone()
    }

    /// Number of dial attempts, successful or not.
    pub fn dials(&self) -> usize {
        self.shared.lock().dials
    }

    pub fn shutdowns(&self) -> usize {
        self.shared.lock().shutdowns
    }
}

impl Dialer for RecordingDialer {
    type Connection = RecordingConnection;

    fn dial(&self) -> io::Result<RecordingConnection> {
        let mut shared = self.shared.lock();
        shared.dials += 1;
        if shared.fail_dials > 0 {
            shared.fail_dials -= 1;
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "injected dial failure",
            ));
        }
        Ok(RecordingConnection {
            shared: Arc::clone(&self.shared),
        })
    }

    fn target(&self) -> String {
        "memory://recording".into()
    }
}

/// Connection produced by [`RecordingDialer`].
pub struct RecordingConnection {
    shared: Arc<Mutex<Shared>>,
}

impl Connection for RecordingConnection {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut shared = self.shared.lock();
        if shared.fail_sends > 0 {
            shared.fail_sends -= 1;
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected send failure",
            ));
        }
        shared.frames.push(frame.to_vec());
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.shared.lock().shutdowns += 1;
        Ok(())
    }
}
