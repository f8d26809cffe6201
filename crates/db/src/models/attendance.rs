//! Attendance register entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use register_core::types::{Date, Id, Timestamp};

/// A row from the `attendance_register` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Id,
    /// `None` for anonymous walk-ins.
    pub member_id: Option<Id>,
    pub group_id: Id,
    pub attendance_date: Date,
    pub is_no_email_check_in: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub reason_for_attending: Option<String>,
    pub member_row_id: Option<String>,
    pub group_row_id: Option<String>,
    pub row_id: Option<String>,
    pub created_at: Timestamp,
}

/// Insert DTO snapshotting the profile at check-in time.
#[derive(Debug, Clone, Default)]
pub struct NewAttendance {
    pub member_id: Option<Id>,
    pub group_id: Id,
    pub attendance_date: Date,
    pub is_no_email_check_in: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub reason_for_attending: Option<String>,
    pub member_row_id: Option<String>,
    pub group_row_id: Option<String>,
}
