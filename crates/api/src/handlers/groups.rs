//! Group listing and ranking handlers.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use register_core::geo::Coordinates;
use register_core::ranking::{rank_by_day, rank_by_distance, GroupCandidate};
use register_core::types::Id;
use register_core::weekday::today_iso;
use register_db::models::Group;
use register_db::repositories::GroupRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/groups -- all non-archived groups, unranked.
pub async fn list_groups(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Group>>>> {
    let groups = GroupRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: groups }))
}

#[derive(Debug, Deserialize)]
pub struct RankedQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One ranked entry: the full group row plus the proximity metric the
/// active mode computed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedGroupEntry {
    #[serde(flatten)]
    pub group: Group,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until: Option<u8>,
}

/// GET /api/v1/groups/ranked -- groups ordered for selection.
///
/// Distance mode when both coordinates are present, day-proximity mode
/// otherwise.
pub async fn ranked_groups(
    State(state): State<AppState>,
    Query(query): Query<RankedQuery>,
) -> AppResult<Json<DataResponse<Vec<RankedGroupEntry>>>> {
    let groups = GroupRepo::list_active(&state.pool).await?;

    let candidates: Vec<GroupCandidate> = groups
        .iter()
        .map(Group::ranking_candidate)
        .collect::<Result<_, _>>()?;

    let ranked = match (query.latitude, query.longitude) {
        (Some(latitude), Some(longitude)) => rank_by_distance(
            &candidates,
            Coordinates {
                latitude,
                longitude,
            },
        ),
        _ => rank_by_day(
            &candidates,
            today_iso(chrono::Utc::now().date_naive()),
        ),
    };

    let mut by_id: HashMap<Id, Group> =
        groups.into_iter().map(|g| (g.id, g)).collect();
    let data = ranked
        .into_iter()
        .filter_map(|entry| {
            by_id.remove(&entry.id).map(|group| RankedGroupEntry {
                group,
                distance_meters: entry.distance_meters,
                days_until: entry.days_until,
            })
        })
        .collect();

    Ok(Json(DataResponse { data }))
}
