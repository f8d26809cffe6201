//! The client-held session value object.
//!
//! A `Session` is the only thing tying a sequence of stateless requests
//! to one in-progress intake. It is created by the check-in workflow,
//! read by every orientation endpoint, and cleared on completion. The
//! transport layer owns (de)serializing it to a client token; nothing
//! in this crate touches cookies.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Id;

/// App-wide intake status carried by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Anonymous check-in: the full profile is still to be collected in
    /// a single step.
    NoEmailInfoRequired,
    /// Member must complete (or resume) the orientation questionnaire.
    OrientationRequired,
    /// Attendance recorded; nothing further required.
    CheckinComplete,
}

/// Identifiers linking one logical intake across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub status: SessionStatus,
    /// The group the visitor selected at check-in.
    pub group_id: Id,
    /// Absent for anonymous check-ins.
    pub member_id: Option<Id>,
    /// Absent until an orientation record exists.
    pub orientation_id: Option<Id>,
    /// Absent for anonymous check-ins.
    pub email: Option<String>,
}

impl Session {
    /// Session for an anonymous visitor: only the pending group is known.
    pub fn anonymous(group_id: Id) -> Self {
        Self {
            status: SessionStatus::NoEmailInfoRequired,
            group_id,
            member_id: None,
            orientation_id: None,
            email: None,
        }
    }

    /// Session for a member entering the orientation flow.
    pub fn orientation(group_id: Id, member_id: Id, orientation_id: Id, email: String) -> Self {
        Self {
            status: SessionStatus::OrientationRequired,
            group_id,
            member_id: Some(member_id),
            orientation_id: Some(orientation_id),
            email: Some(email),
        }
    }

    /// The member id, or a validation error naming the missing field.
    ///
    /// Orientation endpoints use this so a stale or anonymous session
    /// produces a 400 rather than a panic.
    pub fn require_member(&self) -> Result<Id, CoreError> {
        self.member_id
            .ok_or_else(|| CoreError::Validation("Session has no member id".to_string()))
    }

    /// The orientation id, or a validation error.
    pub fn require_orientation(&self) -> Result<Id, CoreError> {
        self.orientation_id
            .ok_or_else(|| CoreError::Validation("Session has no orientation id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn anonymous_session_has_no_member() {
        let session = Session::anonymous(Uuid::new_v4());
        assert_eq!(session.status, SessionStatus::NoEmailInfoRequired);
        assert!(session.require_member().is_err());
        assert!(session.require_orientation().is_err());
    }

    #[test]
    fn orientation_session_exposes_ids() {
        let (group, member, orientation) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let session = Session::orientation(group, member, orientation, "a@b.org".to_string());
        assert_eq!(session.require_member().unwrap(), member);
        assert_eq!(session.require_orientation().unwrap(), orientation);
    }

    #[test]
    fn serializes_status_as_screaming_snake_case() {
        let session = Session::anonymous(Uuid::new_v4());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["status"], "NO_EMAIL_INFO_REQUIRED");
    }
}
