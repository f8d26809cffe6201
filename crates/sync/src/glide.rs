//! Glide big-tables mirror client.
//!
//! Speaks the Glide `mutateTables` API over [`reqwest`]: one add-row
//! mutation per call, bearer-token auth, row ids returned per mutation.
//! Column keys are the opaque identifiers of the mirrored app's tables
//! and are fixed here per table.

use std::time::Duration;

use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use register_core::types::Date;

use crate::export::{AttendanceExport, OrientationExport};
use crate::{ExternalSync, OrientationRowIds};

const MUTATE_URL: &str = "https://api.glideapp.io/api/function/mutateTables";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the mirrored Glide app.
#[derive(Debug, Clone)]
pub struct GlideConfig {
    pub token: String,
    pub app_id: String,
    pub meeting_register_table: String,
    pub orientation_register_table: String,
    pub members_table: String,
}

impl GlideConfig {
    /// Read settings from the environment.
    ///
    /// | Variable | Required | Meaning |
    /// |---|---|---|
    /// | `GLIDE_API_TOKEN` | yes | Bearer token |
    /// | `GLIDE_APP_ID` | yes | Target app |
    /// | `GLIDE_MEETING_REGISTER_TABLE` | yes | Attendance table name |
    /// | `GLIDE_ORIENTATION_REGISTER_TABLE` | yes | Orientation table name |
    /// | `GLIDE_MEMBERS_TABLE` | yes | Members table name |
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            token: std::env::var("GLIDE_API_TOKEN")?,
            app_id: std::env::var("GLIDE_APP_ID")?,
            meeting_register_table: std::env::var("GLIDE_MEETING_REGISTER_TABLE")?,
            orientation_register_table: std::env::var("GLIDE_ORIENTATION_REGISTER_TABLE")?,
            members_table: std::env::var("GLIDE_MEMBERS_TABLE")?,
        })
    }
}

/// Errors from the Glide mutation API. Internal to this module's
/// logging; callers of [`ExternalSync`] never see them.
#[derive(Debug, thiserror::Error)]
enum GlideError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Glide API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Glide response carried no row id")]
    MissingRowId,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    #[serde(rename = "rowID")]
    row_id: Option<String>,
}

/// Reqwest-backed [`ExternalSync`] implementation.
pub struct GlideTables {
    client: reqwest::Client,
    config: GlideConfig,
}

impl GlideTables {
    pub fn new(config: GlideConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    async fn add_row(&self, table: &str, column_values: Value) -> Result<String, GlideError> {
        let body = json!({
            "appID": self.config.app_id,
            "mutations": [{
                "kind": "add-row-to-table",
                "tableName": table,
                "columnValues": column_values,
            }],
        });

        let response = self
            .client
            .post(MUTATE_URL)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GlideError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let results: Vec<MutationResult> = response.json().await?;
        results
            .into_iter()
            .next()
            .and_then(|r| r.row_id)
            .ok_or(GlideError::MissingRowId)
    }

    async fn set_columns(
        &self,
        table: &str,
        row_id: &str,
        column_values: Value,
    ) -> Result<(), GlideError> {
        let body = json!({
            "appID": self.config.app_id,
            "mutations": [{
                "kind": "set-columns-in-row",
                "tableName": table,
                "rowID": row_id,
                "columnValues": column_values,
            }],
        });

        let response = self
            .client
            .post(MUTATE_URL)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GlideError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn meeting_register_row(
        full_name: String,
        gender: Option<&str>,
        date_of_birth: Option<Date>,
        ethnicity: Option<&str>,
        row_type: &str,
        member_ref: &str,
        group_ref: &str,
        created_by: Option<&str>,
        attendance_date: Date,
    ) -> Value {
        json!({
            "Name": full_name,
            "AEp1A": gender.unwrap_or(""),
            "Qdhoi": age_years(date_of_birth, Utc::now().date_naive()),
            "dESvz": ethnicity.unwrap_or(""),
            "JFgGD": row_type,
            "iPrrx": date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
            "JAAfG": member_ref,
            "GFd3n": group_ref,
            "LkjSw": Utc::now().to_rfc3339(),
            "Vcq2n": created_by.unwrap_or(""),
            "mU52w": attendance_date.to_string(),
            "XY4aH": month_number(attendance_date),
            "tzHBr": iso_week_number(attendance_date),
        })
    }
}

#[async_trait::async_trait]
impl ExternalSync for GlideTables {
    async fn append_attendance(&self, export: &AttendanceExport) -> Option<String> {
        let row = Self::meeting_register_row(
            export.full_name(),
            export.gender.as_deref(),
            export.date_of_birth,
            export.ethnicity.as_deref(),
            "Member",
            &export.member_ref,
            &export.group_ref,
            export.email.as_deref(),
            export.attendance_date,
        );

        match self.add_row(&self.config.meeting_register_table, row).await {
            Ok(row_id) => {
                tracing::debug!(row_id, "mirrored attendance row");
                Some(row_id)
            }
            Err(error) => {
                tracing::warn!(%error, "attendance mirror failed");
                None
            }
        }
    }

    async fn append_orientation_bundle(&self, export: &OrientationExport) -> OrientationRowIds {
        let mut ids = OrientationRowIds::default();
        let now = Utc::now().to_rfc3339();

        // Member row first; its row id threads into the other tables.
        let member_row = json!({
            "Name": export.first_name.as_deref().unwrap_or(""),
            "MgZqr": export.last_name.as_deref().unwrap_or(""),
            "aArDw": export.email,
            "PnCjh": export.phone.as_deref().unwrap_or(""),
            "2ZGHp": true,
            "DkzH8": export.group_ref,
            "OQSAU": now,
            "eByvQ": now,
        });
        match self.add_row(&self.config.members_table, member_row).await {
            Ok(row_id) => ids.member_row_id = Some(row_id),
            Err(error) => {
                tracing::warn!(%error, "member mirror failed");
                return ids;
            }
        }
        let member_row_id = ids.member_row_id.as_deref().unwrap_or("");

        let orientation_row = json!({
            "GXhPU": member_row_id,
            "Baj7x": true,
            "Name": export.first_name.as_deref().unwrap_or(""),
            "XeCHw": export.last_name.as_deref().unwrap_or(""),
            "2WzPt": export.phone.as_deref().unwrap_or(""),
            "Jp86G": export.email,
            "2OBsx": export.gender.as_deref().unwrap_or(""),
            "RBQE9": export.ethnicity.as_deref().unwrap_or(""),
            "5nl60": export.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
            "0XOGC": export.emergency_contact_name.as_deref().unwrap_or(""),
            "DOkGp": export.emergency_contact_phone.as_deref().unwrap_or(""),
            "SrTT4": export.emergency_contact_email.as_deref().unwrap_or(""),
            "at4SP": export.reason_for_attending.as_deref().unwrap_or(""),
            "qGAlX": export.source_of_discovery.as_deref().unwrap_or(""),
            "Y2bW7": export.substances_combined(),
            "BZLRS": export.currently_in_treatment.as_deref().unwrap_or(""),
            "7TlsY": export.current_treatment_programme.as_deref().unwrap_or(""),
            "drAEE": export.previous_treatment.as_deref().unwrap_or(""),
            "iprLc": export.previous_treatment_programmes.as_deref().unwrap_or(""),
            "JRVOM": export.previous_recovery_groups.as_deref().unwrap_or(""),
            "Z8iQR": export.previous_recovery_groups_names.as_deref().unwrap_or(""),
            "M5KZ6": export.goals_combined(),
            "14R0J": export.anything_else_important.as_deref().unwrap_or(""),
            "s5GvS": export.how_else_help.as_deref().unwrap_or(""),
            "l6tPr": export.consents.consent_whatsapp,
            "BBA49": export.consents.consent_confidentiality,
            "Gy2b9": export.consents.consent_anonymity,
            "9n1l5": export.consents.consent_liability,
            "vbhT2": export.consents.consent_voluntary,
            "af2ux": export.group_ref,
            "qVmeN": now,
            "hOGr9": now,
        });
        match self
            .add_row(&self.config.orientation_register_table, orientation_row)
            .await
        {
            Ok(row_id) => ids.orientation_row_id = Some(row_id),
            Err(error) => tracing::warn!(%error, "orientation mirror failed"),
        }

        let attendance_row = Self::meeting_register_row(
            export.full_name(),
            export.gender.as_deref(),
            export.date_of_birth,
            export.ethnicity.as_deref(),
            export.reason_for_attending.as_deref().unwrap_or(""),
            member_row_id,
            &export.group_ref,
            Some(export.email.as_str()),
            export.attendance_date,
        );
        match self
            .add_row(&self.config.meeting_register_table, attendance_row)
            .await
        {
            Ok(row_id) => ids.attendance_row_id = Some(row_id),
            Err(error) => tracing::warn!(%error, "attendance mirror failed"),
        }

        // Thread the orientation row id back onto the member row.
        if let Some(orientation_row_id) = ids.orientation_row_id.as_deref() {
            let update = json!({ "eXg3F": orientation_row_id });
            if let Err(error) = self
                .set_columns(&self.config.members_table, member_row_id, update)
                .await
            {
                tracing::warn!(%error, "member row-id writeback failed");
            }
        }

        ids
    }
}

/// Whole years between `date_of_birth` and `today`, as a string column
/// value; empty when unknown.
fn age_years(date_of_birth: Option<Date>, today: Date) -> String {
    let Some(birth) = date_of_birth else {
        return String::new();
    };
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age.to_string()
}

fn month_number(date: Date) -> String {
    date.month().to_string()
}

fn iso_week_number(date: Date) -> String {
    date.iso_week().week().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_whole_years_only() {
        let birth = Some(date(1990, 6, 15));
        assert_eq!(age_years(birth, date(2024, 6, 14)), "33");
        assert_eq!(age_years(birth, date(2024, 6, 15)), "34");
        assert_eq!(age_years(None, date(2024, 6, 15)), "");
    }

    #[test]
    fn week_number_is_iso() {
        // 2024-01-01 is a Monday in ISO week 1.
        assert_eq!(iso_week_number(date(2024, 1, 1)), "1");
        // 2023-01-01 is a Sunday belonging to ISO week 52 of 2022.
        assert_eq!(iso_week_number(date(2023, 1, 1)), "52");
    }

    #[test]
    fn month_number_is_one_based() {
        assert_eq!(month_number(date(2024, 1, 31)), "1");
        assert_eq!(month_number(date(2024, 12, 1)), "12");
    }
}
