pub mod collector;

pub use collector::{split_octet_frames, spawn_tcp_collector};
