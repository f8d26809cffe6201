//! Orientation questionnaire handlers: progressive step saves, the
//! terminal consents step, and the single-step anonymous intake.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use register_core::error::CoreError;
use register_core::orientation::{next_step, Consents, Step, Target};
use register_core::session::SessionStatus;
use register_core::types::{Date, Id};
use register_db::models::{Group, MemberProfile, NewAttendance, OrientationDetails};
use register_db::repositories::{AttendanceRepo, GroupRepo, MemberRepo, OrientationRepo};
use register_sync::{OrientationExport, OrientationRowIds};

use crate::background;
use crate::error::{AppError, AppResult};
use crate::handlers::check_in::{attendance_export, attendance_snapshot};
use crate::session::{clear_session_cookie, SessionCookie};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub step_name: String,
    /// Optional overrides; the session supplies these by default.
    pub member_id: Option<Id>,
    pub group_id: Option<Id>,
    pub orientation_id: Option<Id>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

/// POST /api/v1/orientation/step -- save one step's answer.
///
/// The write fans out per the step's routing table: the first target is
/// required, the rest are best-effort mirrors. The terminal `consents`
/// step completes the orientation.
pub async fn update_step(
    State(state): State<AppState>,
    SessionCookie(session): SessionCookie,
    Json(request): Json<StepRequest>,
) -> AppResult<Response> {
    let step = Step::from_wire(&request.step_name).map_err(AppError::Core)?;

    let member_id = match request.member_id {
        Some(id) => id,
        None => session.require_member()?,
    };
    let group_id = request.group_id.unwrap_or(session.group_id);
    let orientation_id = match request.orientation_id {
        Some(id) => id,
        None => session.require_orientation()?,
    };

    if step == Step::Consents {
        return complete_orientation(&state, member_id, group_id, orientation_id, &request.data)
            .await;
    }

    save_step_value(&state, step, member_id, orientation_id, &request.data).await?;

    // Visibility answers are read back after the write so the step just
    // saved can steer the branch it controls.
    let details = OrientationRepo::find_by_id(&state.pool, orientation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "orientation",
            id: orientation_id,
        })?;
    let next = next_step(step, &details.visibility_answers());

    Ok(Json(StepResponse {
        success: true,
        next_step: next.map(|s| s.as_wire()),
        status: None,
    })
    .into_response())
}

/// Route one step's value to its target tables.
async fn save_step_value(
    state: &AppState,
    step: Step,
    member_id: Id,
    orientation_id: Id,
    data: &serde_json::Value,
) -> AppResult<()> {
    let today = chrono::Utc::now().date_naive();

    // Date-of-birth is the single typed column; everything else is text.
    if step == Step::DateOfBirth {
        let raw = step_value(step, data)?;
        let date = Date::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            AppError::BadRequest(format!("Invalid dateOfBirth '{raw}', expected YYYY-MM-DD"))
        })?;

        if !MemberRepo::set_date_of_birth(&state.pool, member_id, date).await? {
            return Err(CoreError::NotFound {
                entity: "member",
                id: member_id,
            }
            .into());
        }
        if let Err(error) =
            OrientationRepo::set_date_of_birth(&state.pool, orientation_id, date).await
        {
            tracing::warn!(%error, "orientation mirror write failed");
        }
        if let Err(error) =
            AttendanceRepo::mirror_date_of_birth(&state.pool, member_id, today, date).await
        {
            tracing::warn!(%error, "attendance mirror write failed");
        }
        return Ok(());
    }

    let value = step_value(step, data)?;
    let column = step.column();

    for (index, target) in step.targets().iter().enumerate() {
        let required = index == 0;
        match target {
            Target::Member => {
                let updated =
                    MemberRepo::set_text_field(&state.pool, member_id, column, &value).await?;
                if required && !updated {
                    return Err(CoreError::NotFound {
                        entity: "member",
                        id: member_id,
                    }
                    .into());
                }
            }
            Target::OrientationDetails => {
                if required {
                    let updated =
                        OrientationRepo::set_text_field(&state.pool, orientation_id, column, &value)
                            .await?;
                    if !updated {
                        return Err(CoreError::NotFound {
                            entity: "orientation",
                            id: orientation_id,
                        }
                        .into());
                    }
                } else if let Err(error) =
                    OrientationRepo::set_text_field(&state.pool, orientation_id, column, &value)
                        .await
                {
                    tracing::warn!(%error, "orientation mirror write failed");
                }
            }
            Target::Attendance => {
                // Zero rows touched is normal: the attendance row only
                // exists once check-in completed.
                if let Err(error) =
                    AttendanceRepo::mirror_text_field(&state.pool, member_id, today, column, &value)
                        .await
                {
                    tracing::warn!(%error, "attendance mirror write failed");
                }
            }
        }
    }
    Ok(())
}

/// The submitted value for a step, keyed by its wire name.
fn step_value(step: Step, data: &serde_json::Value) -> Result<String, AppError> {
    match data.get(step.as_wire()) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) if !other.is_null() => Ok(other.to_string()),
        _ => Err(AppError::BadRequest(format!(
            "Missing value for step '{}'",
            step.as_wire()
        ))),
    }
}

/// Terminal consents step: validate, persist, snapshot attendance,
/// mirror the whole bundle externally, and clear the session.
async fn complete_orientation(
    state: &AppState,
    member_id: Id,
    group_id: Id,
    orientation_id: Id,
    data: &serde_json::Value,
) -> AppResult<Response> {
    let consents: Consents = serde_json::from_value(data.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid consents payload: {e}")))?;
    consents.validate_all_accepted()?;

    let member = MemberRepo::find_by_id(&state.pool, member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: member_id,
        })?;
    let group = GroupRepo::find_by_id(&state.pool, group_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "group",
            id: group_id,
        })?;

    if !OrientationRepo::set_consents(&state.pool, orientation_id, &consents).await? {
        return Err(CoreError::NotFound {
            entity: "orientation",
            id: orientation_id,
        }
        .into());
    }
    MemberRepo::set_orientation_complete(&state.pool, member_id).await?;

    // The attendance row may already exist (profile steps mirror into
    // it); create it only when missing.
    let today = chrono::Utc::now().date_naive();
    let attendance_id =
        match AttendanceRepo::find_on(&state.pool, member_id, group_id, today).await? {
            Some(record) => record.id,
            None => {
                AttendanceRepo::insert(&state.pool, &attendance_snapshot(&member, &group, today))
                    .await?
            }
        };

    let details = OrientationRepo::find_by_id(&state.pool, orientation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "orientation",
            id: orientation_id,
        })?;

    // The mirror is awaited here (bounded) so the returned row ids can
    // be written back before the kiosk moves on.
    let export = orientation_export(&member, &group, &details, today);
    let wait = Duration::from_secs(state.config.sync_wait_secs);
    let ids = match tokio::time::timeout(wait, state.sync.append_orientation_bundle(&export)).await
    {
        Ok(ids) => ids,
        Err(_) => {
            tracing::warn!(wait_secs = wait.as_secs(), "orientation mirror timed out");
            OrientationRowIds::default()
        }
    };
    write_back_row_ids(state, member_id, orientation_id, attendance_id, &group, &ids).await;

    let body = StepResponse {
        success: true,
        next_step: None,
        status: Some(SessionStatus::CheckinComplete),
    };
    Ok((
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(body),
    )
        .into_response())
}

/// Best-effort persistence of external row ids.
async fn write_back_row_ids(
    state: &AppState,
    member_id: Id,
    orientation_id: Id,
    attendance_id: Id,
    group: &Group,
    ids: &OrientationRowIds,
) {
    if let Err(error) = MemberRepo::set_mirror_row_ids(
        &state.pool,
        member_id,
        ids.member_row_id.as_deref(),
        group.row_id.as_deref(),
        ids.orientation_row_id.as_deref(),
    )
    .await
    {
        tracing::warn!(%error, "member row-id writeback failed");
    }

    if let Err(error) = OrientationRepo::set_mirror_row_ids(
        &state.pool,
        orientation_id,
        ids.orientation_row_id.as_deref(),
        ids.member_row_id.as_deref(),
        group.row_id.as_deref(),
    )
    .await
    {
        tracing::warn!(%error, "orientation row-id writeback failed");
    }

    if let Some(row_id) = ids.attendance_row_id.as_deref() {
        if let Err(error) = AttendanceRepo::set_row_id(&state.pool, attendance_id, row_id).await {
            tracing::warn!(%error, "attendance row-id writeback failed");
        }
    }
}

fn orientation_export(
    member: &register_db::models::Member,
    group: &Group,
    details: &OrientationDetails,
    today: Date,
) -> OrientationExport {
    OrientationExport {
        first_name: member.first_name.clone(),
        last_name: member.last_name.clone(),
        email: member.email.clone().unwrap_or_default(),
        phone: details.phone.clone().or_else(|| member.phone.clone()),
        date_of_birth: details.date_of_birth.or(member.date_of_birth),
        gender: details.gender.clone().or_else(|| member.gender.clone()),
        ethnicity: details
            .ethnicity
            .clone()
            .or_else(|| member.ethnicity.clone()),
        emergency_contact_name: details.emergency_contact_name.clone(),
        emergency_contact_phone: details.emergency_contact_phone.clone(),
        emergency_contact_email: details.emergency_contact_email.clone(),
        reason_for_attending: details
            .reason_for_attending
            .clone()
            .or_else(|| member.reason_for_attending.clone()),
        source_of_discovery: details.source_of_discovery.clone(),
        problematic_substances: details.problematic_substances.clone(),
        problematic_substances_other: details.problematic_substances_other.clone(),
        currently_in_treatment: details.currently_in_treatment.clone(),
        current_treatment_programme: details.current_treatment_programme.clone(),
        previous_treatment: details.previous_treatment.clone(),
        previous_treatment_programmes: details.previous_treatment_programmes.clone(),
        previous_recovery_groups: details.previous_recovery_groups.clone(),
        previous_recovery_groups_names: details.previous_recovery_groups_names.clone(),
        goals_for_attending: details.goals_for_attending.clone(),
        goals_for_attending_other: details.goals_for_attending_other.clone(),
        anything_else_important: details.anything_else_important.clone(),
        how_else_help: details.how_else_help.clone(),
        consents: details.consents(),
        group_ref: group.row_id.clone().unwrap_or_else(|| group.id.to_string()),
        attendance_date: today,
    }
}

// ---------------------------------------------------------------------------
// Single-step intake
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    /// Defaults to the session's pending group.
    pub group_id: Option<Id>,
    #[serde(default)]
    pub is_no_email: bool,
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: MemberProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeResponse {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Id>,
    pub attendance_id: Id,
}

/// POST /api/v1/orientation/intake -- full profile in one step.
///
/// Anonymous submissions never create a member: the profile lands on
/// the attendance row alone, flagged `is_no_email_check_in`.
pub async fn intake(
    State(state): State<AppState>,
    SessionCookie(session): SessionCookie,
    Json(request): Json<IntakeRequest>,
) -> AppResult<Response> {
    let group_id = request.group_id.unwrap_or(session.group_id);
    let group = GroupRepo::find_by_id(&state.pool, group_id)
        .await?
        .filter(|g| !g.archived)
        .ok_or(CoreError::NotFound {
            entity: "group",
            id: group_id,
        })?;

    let today = chrono::Utc::now().date_naive();
    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    if request.is_no_email || email.is_none() {
        let attendance_id = AttendanceRepo::insert(
            &state.pool,
            &anonymous_snapshot(&request.profile, &group, today),
        )
        .await?;

        let body = IntakeResponse {
            status: SessionStatus::CheckinComplete,
            member_id: None,
            attendance_id,
        };
        return Ok((
            AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
            Json(body),
        )
            .into_response());
    }
    let email = email.unwrap_or_default();

    let member = match MemberRepo::find_by_email(&state.pool, email).await? {
        Some(member) => member,
        None => MemberRepo::create_with_email(&state.pool, email).await?,
    };
    MemberRepo::update_profile(&state.pool, member.id, &request.profile).await?;

    let orientation_id =
        match OrientationRepo::find_latest_for_member(&state.pool, member.id).await? {
            Some(details) => details.id,
            None => OrientationRepo::create_for_member(&state.pool, member.id).await?,
        };
    if let Err(error) =
        OrientationRepo::update_profile(&state.pool, orientation_id, &request.profile).await
    {
        tracing::warn!(%error, "orientation mirror write failed");
    }

    let member = MemberRepo::find_by_id(&state.pool, member.id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: member.id,
        })?;
    let attendance_id =
        AttendanceRepo::insert(&state.pool, &attendance_snapshot(&member, &group, today)).await?;
    background::attendance_sync::spawn(
        state.pool.clone(),
        Arc::clone(&state.sync),
        attendance_id,
        attendance_export(&member, &group, today),
    );

    let body = IntakeResponse {
        status: SessionStatus::CheckinComplete,
        member_id: Some(member.id),
        attendance_id,
    };
    Ok((
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(body),
    )
        .into_response())
}

fn anonymous_snapshot(profile: &MemberProfile, group: &Group, date: Date) -> NewAttendance {
    NewAttendance {
        member_id: None,
        group_id: group.id,
        attendance_date: date,
        is_no_email_check_in: true,
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        phone: profile.phone.clone(),
        date_of_birth: profile.date_of_birth,
        gender: profile.gender.clone(),
        ethnicity: profile.ethnicity.clone(),
        reason_for_attending: profile.reason_for_attending.clone(),
        member_row_id: None,
        group_row_id: group.row_id.clone(),
    }
}
