//! Repository for the `orientation_details` table.

use sqlx::PgPool;

use register_core::orientation::Consents;
use register_core::types::{Date, Id};

use crate::models::member::MemberProfile;
use crate::models::orientation::OrientationDetails;

/// Column list for `orientation_details` queries.
const COLUMNS: &str = "id, member_id, phone, date_of_birth, gender, ethnicity, \
     reason_for_attending, emergency_contact_name, emergency_contact_phone, \
     emergency_contact_email, source_of_discovery, problematic_substances, \
     problematic_substances_other, currently_in_treatment, \
     current_treatment_programme, previous_treatment, \
     previous_treatment_programmes, previous_recovery_groups, \
     previous_recovery_groups_names, goals_for_attending, \
     goals_for_attending_other, anything_else_important, how_else_help, \
     consent_whatsapp, consent_confidentiality, consent_anonymity, \
     consent_liability, consent_voluntary, row_id, member_row_id, \
     group_row_id, created_at";

/// Provides CRUD operations for orientation questionnaires.
pub struct OrientationRepo;

impl OrientationRepo {
    /// Open an empty questionnaire for a member, returning the generated ID.
    pub async fn create_for_member(pool: &PgPool, member_id: Id) -> Result<Id, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO orientation_details (member_id) VALUES ($1) RETURNING id",
        )
        .bind(member_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: Id,
    ) -> Result<Option<OrientationDetails>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orientation_details WHERE id = $1");
        sqlx::query_as::<_, OrientationDetails>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The member's most recent questionnaire, if any.
    pub async fn find_latest_for_member(
        pool: &PgPool,
        member_id: Id,
    ) -> Result<Option<OrientationDetails>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orientation_details \
             WHERE member_id = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, OrientationDetails>(&query)
            .bind(member_id)
            .fetch_optional(pool)
            .await
    }

    /// Set one answer column.
    ///
    /// `column` comes from the closed step enum, never from user input.
    pub async fn set_text_field(
        pool: &PgPool,
        id: Id,
        column: &'static str,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("UPDATE orientation_details SET {column} = $2 WHERE id = $1");
        let result = sqlx::query(&query).bind(id).bind(value).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_date_of_birth(
        pool: &PgPool,
        id: Id,
        date_of_birth: Date,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE orientation_details SET date_of_birth = $2 WHERE id = $1")
                .bind(id)
                .bind(date_of_birth)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mirror the profile columns in one statement; absent fields keep
    /// their stored value.
    pub async fn update_profile(
        pool: &PgPool,
        id: Id,
        profile: &MemberProfile,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orientation_details \
             SET phone = COALESCE($2, phone), \
                 date_of_birth = COALESCE($3, date_of_birth), \
                 gender = COALESCE($4, gender), \
                 ethnicity = COALESCE($5, ethnicity), \
                 reason_for_attending = COALESCE($6, reason_for_attending) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&profile.phone)
        .bind(profile.date_of_birth)
        .bind(&profile.gender)
        .bind(&profile.ethnicity)
        .bind(&profile.reason_for_attending)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the terminal consent flags.
    pub async fn set_consents(
        pool: &PgPool,
        id: Id,
        consents: &Consents,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orientation_details \
             SET consent_whatsapp = $2, consent_confidentiality = $3, \
                 consent_anonymity = $4, consent_liability = $5, \
                 consent_voluntary = $6 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(consents.consent_whatsapp)
        .bind(consents.consent_confidentiality)
        .bind(consents.consent_anonymity)
        .bind(consents.consent_liability)
        .bind(consents.consent_voluntary)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record external mirror row ids; absent ids keep their stored value.
    pub async fn set_mirror_row_ids(
        pool: &PgPool,
        id: Id,
        row_id: Option<&str>,
        member_row_id: Option<&str>,
        group_row_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE orientation_details \
             SET row_id = COALESCE($2, row_id), \
                 member_row_id = COALESCE($3, member_row_id), \
                 group_row_id = COALESCE($4, group_row_id) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(row_id)
        .bind(member_row_id)
        .bind(group_row_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
