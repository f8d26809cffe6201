//! Repository for the `members` table.

use sqlx::PgPool;

use register_core::types::{Date, Id};

use crate::models::member::{Member, MemberProfile};

/// Column list for `members` queries.
const COLUMNS: &str = "id, email, first_name, last_name, phone, date_of_birth, \
     gender, ethnicity, reason_for_attending, orientation_complete, \
     row_id, group_row_id, orientation_row_id, created_at, updated_at";

/// Provides CRUD operations for members.
pub struct MemberRepo;

impl MemberRepo {
    pub async fn find_by_id(pool: &PgPool, id: Id) -> Result<Option<Member>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members WHERE id = $1");
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive email lookup.
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Member>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Create a member knowing only the email, returning the full row.
    pub async fn create_with_email(pool: &PgPool, email: &str) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members (email) VALUES (LOWER($1)) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Set one text column captured during orientation.
    ///
    /// `column` comes from the closed step enum, never from user input.
    pub async fn set_text_field(
        pool: &PgPool,
        id: Id,
        column: &'static str,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE members SET {column} = $2, updated_at = NOW() WHERE id = $1"
        );
        let result = sqlx::query(&query).bind(id).bind(value).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_date_of_birth(
        pool: &PgPool,
        id: Id,
        date_of_birth: Date,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members SET date_of_birth = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(date_of_birth)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a full profile in one statement; absent fields keep their
    /// stored value.
    pub async fn update_profile(
        pool: &PgPool,
        id: Id,
        profile: &MemberProfile,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members \
             SET first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 phone = COALESCE($4, phone), \
                 date_of_birth = COALESCE($5, date_of_birth), \
                 gender = COALESCE($6, gender), \
                 ethnicity = COALESCE($7, ethnicity), \
                 reason_for_attending = COALESCE($8, reason_for_attending), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(profile.date_of_birth)
        .bind(&profile.gender)
        .bind(&profile.ethnicity)
        .bind(&profile.reason_for_attending)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_orientation_complete(pool: &PgPool, id: Id) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members SET orientation_complete = true, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record external mirror row ids; absent ids keep their stored value.
    pub async fn set_mirror_row_ids(
        pool: &PgPool,
        id: Id,
        row_id: Option<&str>,
        group_row_id: Option<&str>,
        orientation_row_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE members \
             SET row_id = COALESCE($2, row_id), \
                 group_row_id = COALESCE($3, group_row_id), \
                 orientation_row_id = COALESCE($4, orientation_row_id), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(row_id)
        .bind(group_row_id)
        .bind(orientation_row_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete every member whose email ends with `@domain`, along with
    /// their orientation details and attendance rows. Returns the
    /// number of members removed.
    pub async fn purge_by_email_domain(pool: &PgPool, domain: &str) -> Result<u64, sqlx::Error> {
        let pattern = format!("%@{}", domain.trim_start_matches('@'));
        let mut tx = pool.begin().await?;

        // Attendance rows only detach on member delete, so remove them
        // explicitly; orientation_details cascades.
        sqlx::query(
            "DELETE FROM attendance_register \
             WHERE member_id IN (SELECT id FROM members WHERE email LIKE $1)",
        )
        .bind(&pattern)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM members WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
