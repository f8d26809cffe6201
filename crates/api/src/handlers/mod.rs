//! HTTP request handlers.

pub mod check_in;
pub mod groups;
pub mod orientation;
