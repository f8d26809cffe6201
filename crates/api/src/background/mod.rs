//! Background tasks.
//!
//! Each submodule provides an async job intended to be spawned via
//! `tokio::spawn` so request handlers never block on it.

pub mod attendance_sync;
