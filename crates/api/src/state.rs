use std::sync::Arc;

use register_core::checkin::{DayPolicy, LocationPolicy};
use register_sync::ExternalSync;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: register_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// External tables mirror (Glide, or a no-op when disabled).
    pub sync: Arc<dyn ExternalSync>,
    /// Check-in location policy, chosen from config at startup.
    pub location_policy: Arc<dyn LocationPolicy>,
    /// Check-in meeting-day policy, chosen from config at startup.
    pub day_policy: Arc<dyn DayPolicy>,
}
