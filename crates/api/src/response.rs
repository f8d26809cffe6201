//! Shared response envelope types for API handlers.
//!
//! Listing endpoints use a `{ "data": ... }` envelope. Workflow
//! endpoints (check-in, orientation) return their own flat payloads
//! because the kiosk client consumes them directly.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
