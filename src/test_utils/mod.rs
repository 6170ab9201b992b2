//! Test-only helpers shared across crate unit tests.
//!
//! This module is only compiled for unit tests and provides an in-memory
//! dialer so the connection manager can be exercised without sockets.

pub mod recording_dialer;
