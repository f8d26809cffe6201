//! Group table importer.
//!
//! Reads a JSON export of the upstream group table (an array of objects
//! keyed by the original column headers), normalizes the messy weekday
//! and time encodings, geocodes in-person venues, and upserts into the
//! `groups` table keyed by the external row id.

use std::path::Path;

use anyhow::Context;
use chrono::NaiveTime;
use serde::Deserialize;

use register_core::ranking::GroupFormat;
use register_core::weekday::normalize_meeting_day;
use register_db::models::NewGroup;
use register_db::repositories::GroupRepo;
use register_db::DbPool;

use crate::geocode::{Geocoder, RATE_LIMIT};

/// One row of the upstream export, original column headers and all.
#[derive(Debug, Default, Deserialize)]
pub struct ImportRow {
    #[serde(rename = "🔒 Row ID", default)]
    pub row_id: Option<String>,
    #[serde(rename = "Status/Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Group/Name Override", default)]
    pub name: Option<String>,
    #[serde(rename = "Group/Format", default)]
    pub format: Option<String>,
    #[serde(rename = "Group/Specialisation", default)]
    pub specialisation: Option<String>,
    #[serde(rename = "Location/Street Address Input", default)]
    pub street_address: Option<String>,
    #[serde(rename = "Location/Suburb Input", default)]
    pub suburb: Option<String>,
    #[serde(rename = "Location/City Input", default)]
    pub city: Option<String>,
    #[serde(rename = "Location/Postal Code Input", default)]
    pub postal_code: Option<String>,
    #[serde(rename = "Location/Country Input", default)]
    pub country: Option<String>,
    #[serde(rename = "Temp/Country", default)]
    pub temp_country: Option<String>,
    #[serde(rename = "Date & Time/Day of Week", default)]
    pub meeting_day: Option<String>,
    #[serde(rename = "Date & Time/Start Time Input", default)]
    pub meeting_time: Option<String>,
    #[serde(rename = "Affiliate/RID", default)]
    pub affiliate_rid: Option<String>,
}

impl ImportRow {
    fn is_archived(&self) -> bool {
        self.status.as_deref() == Some("Archived")
    }

    /// Full address for geocoding, joining the non-empty location parts.
    /// The country column has a filled-in fallback in the export.
    fn address(&self) -> String {
        let country = [self.country.as_deref(), self.temp_country.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("South Africa");

        [
            self.street_address.as_deref(),
            self.suburb.as_deref(),
            self.city.as_deref(),
            self.postal_code.as_deref(),
            Some(country),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Parse the observed upstream time encodings: "19:00", "18:30",
/// "7:00 PM".
pub fn parse_meeting_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    let (hour_part, rest) = trimmed.split_once(':')?;

    let hour: u32 = hour_part
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    let minute: u32 = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;

    let upper = trimmed.to_ascii_uppercase();
    let hour = if upper.contains("PM") && hour < 12 {
        hour + 12
    } else if upper.contains("AM") && hour == 12 {
        0
    } else {
        hour
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub geocoded: usize,
}

/// Import a JSON export file, upserting each named row keyed by its
/// external row id. In-person rows get geocoded unless
/// `skip_geocoding` is set.
pub async fn import_file(
    pool: &DbPool,
    path: &Path,
    skip_geocoding: bool,
) -> anyhow::Result<ImportSummary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows: Vec<ImportRow> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of group rows", path.display()))?;

    let geocoder = if skip_geocoding {
        None
    } else {
        Some(Geocoder::new()?)
    };

    let mut summary = ImportSummary::default();
    for row in rows {
        summary.processed += 1;

        let Some(name) = row.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            tracing::warn!("skipping row with no name");
            summary.skipped += 1;
            continue;
        };
        let format = match row.format.as_deref().map(GroupFormat::from_str_db) {
            Some(Ok(format)) => format,
            _ => {
                tracing::warn!(name, format = ?row.format, "skipping row with unusable format");
                summary.skipped += 1;
                continue;
            }
        };

        let mut group = NewGroup {
            name: name.to_string(),
            format: format.as_str().to_string(),
            street_address: row
                .street_address
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            meeting_day: row
                .meeting_day
                .as_deref()
                .and_then(normalize_meeting_day)
                .map(i16::from),
            meeting_time: row.meeting_time.as_deref().and_then(parse_meeting_time),
            specialisation: row.specialisation.clone().filter(|s| !s.is_empty()),
            affiliate_row_id: row.affiliate_rid.clone().filter(|s| !s.is_empty()),
            row_id: row.row_id.clone().filter(|s| !s.is_empty()),
            ..NewGroup::default()
        };

        if let (Some(geocoder), GroupFormat::InPerson) = (&geocoder, format) {
            let address = row.address();
            if !address.is_empty() {
                tokio::time::sleep(RATE_LIMIT).await;
                match geocoder.geocode(&address).await {
                    Ok(Some(coords)) => {
                        group.latitude = Some(coords.latitude);
                        group.longitude = Some(coords.longitude);
                        summary.geocoded += 1;
                    }
                    Ok(None) => tracing::warn!(name, address, "no geocoding match"),
                    Err(error) => tracing::warn!(name, %error, "geocoding failed"),
                }
            }
        }

        let existing = match group.row_id.as_deref() {
            Some(row_id) => GroupRepo::find_by_row_id(pool, row_id).await?,
            None => None,
        };
        let id = match existing {
            Some(current) => {
                // Re-imports keep previously geocoded coordinates
                // rather than clearing them.
                if group.latitude.is_none() {
                    group.latitude = current.latitude;
                    group.longitude = current.longitude;
                }
                GroupRepo::update_imported(pool, current.id, &group).await?;
                summary.updated += 1;
                current.id
            }
            None => {
                let id = GroupRepo::insert(pool, &group).await?;
                summary.inserted += 1;
                id
            }
        };
        GroupRepo::set_archived(pool, id, row.is_archived()).await?;

        tracing::info!(name, %id, archived = row.is_archived(), "imported group");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_24_hour_times() {
        assert_eq!(
            parse_meeting_time("19:00"),
            NaiveTime::from_hms_opt(19, 0, 0)
        );
        assert_eq!(
            parse_meeting_time(" 18:30 "),
            NaiveTime::from_hms_opt(18, 30, 0)
        );
    }

    #[test]
    fn parses_12_hour_times() {
        assert_eq!(
            parse_meeting_time("7:00 PM"),
            NaiveTime::from_hms_opt(19, 0, 0)
        );
        assert_eq!(
            parse_meeting_time("12:15 am"),
            NaiveTime::from_hms_opt(0, 15, 0)
        );
        assert_eq!(
            parse_meeting_time("12:00 PM"),
            NaiveTime::from_hms_opt(12, 0, 0)
        );
    }

    #[test]
    fn rejects_unusable_times() {
        assert_eq!(parse_meeting_time(""), None);
        assert_eq!(parse_meeting_time("evening"), None);
        assert_eq!(parse_meeting_time("25:00"), None);
    }

    #[test]
    fn address_joins_nonempty_parts_with_country_fallback() {
        let row = ImportRow {
            street_address: Some("12 Main Road".to_string()),
            suburb: Some("Observatory".to_string()),
            city: Some("Cape Town".to_string()),
            postal_code: Some("".to_string()),
            ..ImportRow::default()
        };
        assert_eq!(
            row.address(),
            "12 Main Road, Observatory, Cape Town, South Africa"
        );
    }

    #[test]
    fn address_prefers_explicit_country() {
        let row = ImportRow {
            street_address: Some("1 High St".to_string()),
            country: Some("Namibia".to_string()),
            temp_country: Some("South Africa".to_string()),
            ..ImportRow::default()
        };
        assert_eq!(row.address(), "1 High St, Namibia");
    }

    #[test]
    fn deserializes_original_column_headers() {
        let row: ImportRow = serde_json::from_str(
            r#"{
                "🔒 Row ID": "abc123",
                "Group/Name Override": "Observatory Tuesday",
                "Group/Format": "In-person",
                "Date & Time/Day of Week": "Tuesday",
                "Date & Time/Start Time Input": "19:00",
                "Status/Status": "Archived"
            }"#,
        )
        .unwrap();

        assert_eq!(row.row_id.as_deref(), Some("abc123"));
        assert_eq!(row.name.as_deref(), Some("Observatory Tuesday"));
        assert!(row.is_archived());
        assert_eq!(
            row.meeting_day.as_deref().and_then(normalize_meeting_day),
            Some(2)
        );
    }
}
