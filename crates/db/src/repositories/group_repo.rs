//! Repository for the `groups` table.

use sqlx::PgPool;

use register_core::types::Id;

use crate::models::group::{Group, NewGroup};

/// Column list for `groups` queries.
const COLUMNS: &str = "id, name, format, street_address, latitude, longitude, \
     meeting_day, meeting_time, specialisation, affiliate_row_id, row_id, \
     archived, created_at, updated_at";

/// Provides CRUD operations for groups.
pub struct GroupRepo;

impl GroupRepo {
    /// List all non-archived groups, alphabetically.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM groups WHERE archived = false ORDER BY name"
        );
        sqlx::query_as::<_, Group>(&query).fetch_all(pool).await
    }

    /// List every group, archived included.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups ORDER BY name");
        sqlx::query_as::<_, Group>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: Id) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE id = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find by the external mirror row id; the importer's upsert key.
    pub async fn find_by_row_id(
        pool: &PgPool,
        row_id: &str,
    ) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE row_id = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(row_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert an imported group, returning the generated ID.
    pub async fn insert(pool: &PgPool, group: &NewGroup) -> Result<Id, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO groups (name, format, street_address, latitude, longitude, \
             meeting_day, meeting_time, specialisation, affiliate_row_id, row_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id",
        )
        .bind(&group.name)
        .bind(&group.format)
        .bind(&group.street_address)
        .bind(group.latitude)
        .bind(group.longitude)
        .bind(group.meeting_day)
        .bind(group.meeting_time)
        .bind(&group.specialisation)
        .bind(&group.affiliate_row_id)
        .bind(&group.row_id)
        .fetch_one(pool)
        .await
    }

    /// Overwrite an existing group with re-imported fields.
    pub async fn update_imported(
        pool: &PgPool,
        id: Id,
        group: &NewGroup,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE groups \
             SET name = $2, format = $3, street_address = $4, latitude = $5, \
                 longitude = $6, meeting_day = $7, meeting_time = $8, \
                 specialisation = $9, affiliate_row_id = $10, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&group.name)
        .bind(&group.format)
        .bind(&group.street_address)
        .bind(group.latitude)
        .bind(group.longitude)
        .bind(group.meeting_day)
        .bind(group.meeting_time)
        .bind(&group.specialisation)
        .bind(&group.affiliate_row_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Archive or unarchive a group. Returns `false` when no such group.
    pub async fn set_archived(
        pool: &PgPool,
        id: Id,
        archived: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE groups SET archived = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(archived)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// In-person groups with an address but no coordinates yet.
    pub async fn list_missing_coordinates(pool: &PgPool) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM groups \
             WHERE format = 'in-person' \
               AND street_address IS NOT NULL \
               AND (latitude IS NULL OR longitude IS NULL) \
             ORDER BY name"
        );
        sqlx::query_as::<_, Group>(&query).fetch_all(pool).await
    }

    pub async fn set_coordinates(
        pool: &PgPool,
        id: Id,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE groups SET latitude = $2, longitude = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .execute(pool)
        .await?;
        Ok(())
    }
}
