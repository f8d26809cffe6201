use crate::types::Id;

/// Machine-readable error codes surfaced in JSON error bodies.
pub mod codes {
    pub const GROUP_NOT_FOUND: &str = "GROUP_NOT_FOUND";
    pub const MEMBER_NOT_FOUND: &str = "MEMBER_NOT_FOUND";
    pub const DUPLICATE_CHECKIN: &str = "DUPLICATE_CHECKIN";
    pub const OUTSIDE_RADIUS: &str = "OUTSIDE_RADIUS";
    pub const WRONG_DAY: &str = "WRONG_DAY";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Domain-level error taxonomy.
///
/// `Conflict` and `Forbidden` carry an explicit code because the HTTP
/// contract distinguishes policy rejections (`OUTSIDE_RADIUS`,
/// `WRONG_DAY`) from duplicate check-ins (`DUPLICATE_CHECKIN`).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: Id },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    #[error("{message}")]
    Forbidden {
        code: &'static str,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a duplicate same-day check-in conflict.
    pub fn duplicate_checkin() -> Self {
        Self::Conflict {
            code: codes::DUPLICATE_CHECKIN,
            message: "User has already checked in today".to_string(),
        }
    }
}
