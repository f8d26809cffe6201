//! Member entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use register_core::types::{Date, Id, Timestamp};

/// A row from the `members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Id,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub reason_for_attending: Option<String>,
    pub orientation_complete: bool,
    pub row_id: Option<String>,
    pub group_row_id: Option<String>,
    pub orientation_row_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Full-profile update applied by the single-step intake.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub reason_for_attending: Option<String>,
}
