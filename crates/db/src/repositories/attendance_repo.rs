//! Repository for the `attendance_register` table.

use sqlx::PgPool;

use register_core::types::{Date, Id};

use crate::models::attendance::{AttendanceRecord, NewAttendance};

/// Column list for `attendance_register` queries.
const COLUMNS: &str = "id, member_id, group_id, attendance_date, is_no_email_check_in, \
     first_name, last_name, phone, date_of_birth, gender, ethnicity, \
     reason_for_attending, member_row_id, group_row_id, row_id, created_at";

/// Provides CRUD operations for attendance records.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// Insert an attendance row, returning the generated ID.
    ///
    /// The partial unique index on (member, group, date) makes this the
    /// duplicate same-day guard: a second insert for the same member
    /// surfaces as a unique violation.
    pub async fn insert(pool: &PgPool, record: &NewAttendance) -> Result<Id, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO attendance_register \
             (member_id, group_id, attendance_date, is_no_email_check_in, \
              first_name, last_name, phone, date_of_birth, gender, ethnicity, \
              reason_for_attending, member_row_id, group_row_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING id",
        )
        .bind(record.member_id)
        .bind(record.group_id)
        .bind(record.attendance_date)
        .bind(record.is_no_email_check_in)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.phone)
        .bind(record.date_of_birth)
        .bind(&record.gender)
        .bind(&record.ethnicity)
        .bind(&record.reason_for_attending)
        .bind(&record.member_row_id)
        .bind(&record.group_row_id)
        .fetch_one(pool)
        .await
    }

    /// Whether the member already checked in to this group on this date.
    pub async fn exists_on(
        pool: &PgPool,
        member_id: Id,
        group_id: Id,
        date: Date,
    ) -> Result<bool, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_register \
             WHERE member_id = $1 AND group_id = $2 AND attendance_date = $3",
        )
        .bind(member_id)
        .bind(group_id)
        .bind(date)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0) > 0)
    }

    pub async fn find_on(
        pool: &PgPool,
        member_id: Id,
        group_id: Id,
        date: Date,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_register \
             WHERE member_id = $1 AND group_id = $2 AND attendance_date = $3"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(member_id)
            .bind(group_id)
            .bind(date)
            .fetch_optional(pool)
            .await
    }

    /// Mirror one profile field onto the member's rows for `date`.
    ///
    /// Returns the number of rows touched; zero is normal when the
    /// attendance row does not exist yet. `column` comes from the closed
    /// step enum, never from user input.
    pub async fn mirror_text_field(
        pool: &PgPool,
        member_id: Id,
        date: Date,
        column: &'static str,
        value: &str,
    ) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE attendance_register SET {column} = $3 \
             WHERE member_id = $1 AND attendance_date = $2"
        );
        let result = sqlx::query(&query)
            .bind(member_id)
            .bind(date)
            .bind(value)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn mirror_date_of_birth(
        pool: &PgPool,
        member_id: Id,
        date: Date,
        date_of_birth: Date,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE attendance_register SET date_of_birth = $3 \
             WHERE member_id = $1 AND attendance_date = $2",
        )
        .bind(member_id)
        .bind(date)
        .bind(date_of_birth)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Record the external mirror row id once the sync lands.
    pub async fn set_row_id(pool: &PgPool, id: Id, row_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE attendance_register SET row_id = $2 WHERE id = $1")
            .bind(id)
            .bind(row_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
