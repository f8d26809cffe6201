use crate::session::SessionConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Session token configuration (secret, expiry).
    pub session: SessionConfig,
    /// Reject in-person check-ins farther than 200 m from the venue.
    pub enforce_radius: bool,
    /// Reject check-ins on days the group does not meet.
    pub enforce_meeting_day: bool,
    /// Mirror writes to the external tables app.
    pub external_sync_enabled: bool,
    /// How long the orientation completion waits for the external
    /// mirror before giving up (default: `15`).
    pub sync_wait_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `ENFORCE_CHECKIN_RADIUS` | `false`                    |
    /// | `ENFORCE_MEETING_DAY`    | `false`                    |
    /// | `ENABLE_EXTERNAL_SYNC`   | `false`                    |
    /// | `SYNC_WAIT_SECS`         | `15`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let enforce_radius = env_flag("ENFORCE_CHECKIN_RADIUS", false);
        let enforce_meeting_day = env_flag("ENFORCE_MEETING_DAY", false);
        let external_sync_enabled = env_flag("ENABLE_EXTERNAL_SYNC", false);

        let sync_wait_secs: u64 = std::env::var("SYNC_WAIT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("SYNC_WAIT_SECS must be a valid u64");

        let session = SessionConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session,
            enforce_radius,
            enforce_meeting_day,
            external_sync_enabled,
            sync_wait_secs,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(value.as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}
