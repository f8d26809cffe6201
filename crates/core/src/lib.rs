//! Domain logic for the group check-in and orientation intake system.
//!
//! This crate has no internal dependencies and no I/O: it holds the
//! error taxonomy, the group ranking policy, the check-in policy hooks,
//! the orientation step machine, and the session value object. The
//! `db`, `sync`, and `api` crates plug persistence and transport around
//! these pieces.

pub mod checkin;
pub mod error;
pub mod geo;
pub mod orientation;
pub mod ranking;
pub mod session;
pub mod types;
pub mod weekday;
