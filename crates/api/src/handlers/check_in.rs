//! Check-in workflow handler.
//!
//! One POST decides the visitor's path: anonymous info capture,
//! orientation, or a completed check-in with an attendance row. The
//! outcome is carried to the client in the session cookie as well as
//! the response body.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use register_core::error::CoreError;
use register_core::geo::Coordinates;
use register_core::session::{Session, SessionStatus};
use register_core::types::{Date, Id};
use register_core::weekday::today_iso;
use register_db::models::{Group, Member, NewAttendance};
use register_db::repositories::{AttendanceRepo, GroupRepo, MemberRepo, OrientationRepo};
use register_sync::AttendanceExport;

use crate::background;
use crate::error::{AppError, AppResult};
use crate::session::{clear_session_cookie, encode_session, session_cookie};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub email: Option<String>,
    pub group_id: Id,
    #[serde(default)]
    pub is_no_email: bool,
    pub geolocation: Option<Coordinates>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_member: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_id: Option<Id>,
}

/// POST /api/v1/check-in.
pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> AppResult<Response> {
    let group = GroupRepo::find_by_id(&state.pool, request.group_id)
        .await?
        .filter(|g| !g.archived)
        .ok_or(CoreError::NotFound {
            entity: "group",
            id: request.group_id,
        })?;

    let site = group.site()?;
    let today = chrono::Utc::now().date_naive();
    state.location_policy.validate(request.geolocation, &site)?;
    state.day_policy.validate(&site, today_iso(today))?;

    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    // Anonymous walk-in: remember the pending group only; the profile
    // arrives later through the single-step intake.
    let Some(email) = email else {
        return respond_with_session(&state, Session::anonymous(group.id), None);
    };
    if request.is_no_email {
        return respond_with_session(&state, Session::anonymous(group.id), None);
    }

    match MemberRepo::find_by_email(&state.pool, email).await? {
        None => {
            let member = MemberRepo::create_with_email(&state.pool, email).await?;
            let orientation_id =
                OrientationRepo::create_for_member(&state.pool, member.id).await?;
            tracing::info!(member_id = %member.id, "created member at check-in");

            let session =
                Session::orientation(group.id, member.id, orientation_id, email.to_string());
            respond_with_session(&state, session, Some(true))
        }
        Some(member) => {
            if AttendanceRepo::exists_on(&state.pool, member.id, group.id, today).await? {
                return Err(CoreError::duplicate_checkin().into());
            }

            if !member.orientation_complete {
                let orientation_id =
                    match OrientationRepo::find_latest_for_member(&state.pool, member.id).await? {
                        Some(details) => details.id,
                        None => OrientationRepo::create_for_member(&state.pool, member.id).await?,
                    };
                let session =
                    Session::orientation(group.id, member.id, orientation_id, email.to_string());
                return respond_with_session(&state, session, Some(false));
            }

            // Returning member: record attendance and mirror it without
            // blocking the response.
            let attendance_id =
                AttendanceRepo::insert(&state.pool, &attendance_snapshot(&member, &group, today))
                    .await?;
            background::attendance_sync::spawn(
                state.pool.clone(),
                Arc::clone(&state.sync),
                attendance_id,
                attendance_export(&member, &group, today),
            );

            let body = CheckInResponse {
                status: SessionStatus::CheckinComplete,
                is_new_member: None,
                member_id: Some(member.id),
                orientation_id: None,
                attendance_id: Some(attendance_id),
            };
            Ok((
                AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
                Json(body),
            )
                .into_response())
        }
    }
}

fn respond_with_session(
    state: &AppState,
    session: Session,
    is_new_member: Option<bool>,
) -> AppResult<Response> {
    let token = encode_session(&session, &state.config.session)
        .map_err(|e| AppError::InternalError(format!("Failed to sign session: {e}")))?;

    let body = CheckInResponse {
        status: session.status,
        is_new_member,
        member_id: session.member_id,
        orientation_id: session.orientation_id,
        attendance_id: None,
    };
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&token))]),
        Json(body),
    )
        .into_response())
}

/// Attendance row snapshotting the member profile as it stands today.
pub fn attendance_snapshot(member: &Member, group: &Group, date: Date) -> NewAttendance {
    NewAttendance {
        member_id: Some(member.id),
        group_id: group.id,
        attendance_date: date,
        is_no_email_check_in: false,
        first_name: member.first_name.clone(),
        last_name: member.last_name.clone(),
        phone: member.phone.clone(),
        date_of_birth: member.date_of_birth,
        gender: member.gender.clone(),
        ethnicity: member.ethnicity.clone(),
        reason_for_attending: member.reason_for_attending.clone(),
        member_row_id: member.row_id.clone(),
        group_row_id: group.row_id.clone(),
    }
}

/// Export DTO for the external meeting register mirror.
pub fn attendance_export(member: &Member, group: &Group, date: Date) -> AttendanceExport {
    AttendanceExport {
        first_name: member.first_name.clone(),
        last_name: member.last_name.clone(),
        gender: member.gender.clone(),
        date_of_birth: member.date_of_birth,
        ethnicity: member.ethnicity.clone(),
        reason_for_attending: member.reason_for_attending.clone(),
        email: member.email.clone(),
        member_ref: member
            .row_id
            .clone()
            .unwrap_or_else(|| member.id.to_string()),
        group_ref: group.row_id.clone().unwrap_or_else(|| group.id.to_string()),
        attendance_date: date,
    }
}
