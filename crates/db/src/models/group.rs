//! Group entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use register_core::checkin::GroupSite;
use register_core::error::CoreError;
use register_core::geo::Coordinates;
use register_core::ranking::{GroupCandidate, GroupFormat};
use register_core::types::{Id, Timestamp};

/// A row from the `groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Id,
    pub name: String,
    pub format: String,
    pub street_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Normalized meeting weekday, 1=Monday..7=Sunday.
    pub meeting_day: Option<i16>,
    pub meeting_time: Option<chrono::NaiveTime>,
    pub specialisation: Option<String>,
    pub affiliate_row_id: Option<String>,
    pub row_id: Option<String>,
    pub archived: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Group {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    fn meeting_day_u8(&self) -> Option<u8> {
        self.meeting_day.and_then(|d| u8::try_from(d).ok())
    }

    /// The view the ranking policy operates on.
    pub fn ranking_candidate(&self) -> Result<GroupCandidate, CoreError> {
        Ok(GroupCandidate {
            id: self.id,
            format: GroupFormat::from_str_db(&self.format)?,
            meeting_day: self.meeting_day_u8(),
            meeting_time: self.meeting_time,
            coordinates: self.coordinates(),
        })
    }

    /// The view the check-in policies operate on.
    pub fn site(&self) -> Result<GroupSite, CoreError> {
        Ok(GroupSite {
            format: GroupFormat::from_str_db(&self.format)?,
            coordinates: self.coordinates(),
            meeting_day: self.meeting_day_u8(),
        })
    }
}

/// Insert/update DTO for the admin group importer. Fields arrive
/// already normalized (weekday to 1..7, format to the check domain).
#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub format: String,
    pub street_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub meeting_day: Option<i16>,
    pub meeting_time: Option<chrono::NaiveTime>,
    pub specialisation: Option<String>,
    pub affiliate_row_id: Option<String>,
    pub row_id: Option<String>,
}
