//! Integration tests for the orientation step and intake endpoints,
//! including session continuity from check-in.

mod common;

use axum::http::{header, StatusCode};
use axum::Router;
use common::{
    body_json, extract_session_cookie, in_person_group, post_json, post_json_with_cookie,
    seed_group,
};
use register_db::repositories::{AttendanceRepo, MemberRepo, OrientationRepo};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Check in with a fresh email and return the session cookie plus the
/// created member and orientation ids.
async fn begin_orientation(app: Router, group_id: Uuid, email: &str) -> (String, Uuid, Uuid) {
    let response = post_json(
        app,
        "/api/v1/check-in",
        json!({ "groupId": group_id, "email": email }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = extract_session_cookie(&response).expect("check-in must issue a session cookie");
    let json = body_json(response).await;
    assert_eq!(json["status"], "ORIENTATION_REQUIRED");

    let member_id = Uuid::parse_str(json["memberId"].as_str().unwrap()).unwrap();
    let orientation_id = Uuid::parse_str(json["orientationId"].as_str().unwrap()).unwrap();
    (cookie, member_id, orientation_id)
}

fn all_consents() -> serde_json::Value {
    json!({
        "consentWhatsapp": true,
        "consentConfidentiality": true,
        "consentAnonymity": true,
        "consentLiability": true,
        "consentVoluntary": true,
    })
}

// ---------------------------------------------------------------------------
// Session handling
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn step_without_session_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/orientation/step",
        json!({ "stepName": "firstName", "data": { "firstName": "Thabo" } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "SESSION_EXPIRED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn step_with_garbage_cookie_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        "register_session=not-a-token",
        json!({ "stepName": "firstName", "data": { "firstName": "Thabo" } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn step_with_anonymous_session_returns_400(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool);

    // An anonymous check-in issues a session with no member or
    // orientation ids, so the step endpoint has nothing to write to.
    let session = register_core::session::Session::anonymous(group_id);
    let cookie = common::session_cookie_for(&session);
    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "firstName", "data": { "firstName": "Thabo" } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Progressive step saves
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn first_name_step_saves_and_advances(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, member_id, _) =
        begin_orientation(app.clone(), group_id, "thabo@example.com").await;

    // The step body carries only the step name and value; the member and
    // orientation ids ride in on the session cookie from check-in.
    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "firstName", "data": { "firstName": "Thabo" } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["nextStep"], "lastName");

    let member = MemberRepo::find_by_id(&pool, member_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.first_name.as_deref(), Some("Thabo"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn date_of_birth_step_parses_iso_date(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, member_id, _) = begin_orientation(app.clone(), group_id, "dob@example.com").await;

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "dateOfBirth", "data": { "dateOfBirth": "1990-05-17" } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let member = MemberRepo::find_by_id(&pool, member_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        member.date_of_birth,
        chrono::NaiveDate::from_ymd_opt(1990, 5, 17)
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn date_of_birth_step_rejects_bad_format(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, _, _) = begin_orientation(app.clone(), group_id, "dob@example.com").await;

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "dateOfBirth", "data": { "dateOfBirth": "17/05/1990" } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_step_returns_400(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, _, _) = begin_orientation(app.clone(), group_id, "lost@example.com").await;

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "favouriteColour", "data": { "favouriteColour": "blue" } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_step_value_returns_400(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, _, _) = begin_orientation(app.clone(), group_id, "blank@example.com").await;

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "gender", "data": {} }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Conditional branches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn other_substances_answer_reveals_followup_step(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, _, _) = begin_orientation(app.clone(), group_id, "other@example.com").await;

    let json = body_json(
        post_json_with_cookie(
            app,
            "/api/v1/orientation/step",
            &cookie,
            json!({ "stepName": "problematicSubstances", "data": { "problematicSubstances": "Other" } }),
        )
        .await,
    )
    .await;

    assert_eq!(json["nextStep"], "problematicSubstancesOther");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn named_substances_answer_skips_followup_step(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, _, _) = begin_orientation(app.clone(), group_id, "alcohol@example.com").await;

    let json = body_json(
        post_json_with_cookie(
            app,
            "/api/v1/orientation/step",
            &cookie,
            json!({ "stepName": "problematicSubstances", "data": { "problematicSubstances": "Alcohol" } }),
        )
        .await,
    )
    .await;

    assert_eq!(json["nextStep"], "currentlyInTreatment");
}

// ---------------------------------------------------------------------------
// Terminal consents step
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn consents_with_missing_flag_returns_400(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, member_id, _) =
        begin_orientation(app.clone(), group_id, "hesitant@example.com").await;

    let mut consents = all_consents();
    consents["consentLiability"] = json!(false);

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "consents", "data": consents }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let member = MemberRepo::find_by_id(&pool, member_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!member.orientation_complete);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn consents_completes_orientation_and_records_attendance(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Newcomers", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());
    let (cookie, member_id, orientation_id) =
        begin_orientation(app.clone(), group_id, "graduate@example.com").await;

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/step",
        &cookie,
        json!({ "stepName": "consents", "data": all_consents() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    // Completion clears the kiosk session.
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("Max-Age=0"));

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["status"], "CHECKIN_COMPLETE");
    assert!(json["nextStep"].is_null());

    let member = MemberRepo::find_by_id(&pool, member_id)
        .await
        .unwrap()
        .unwrap();
    assert!(member.orientation_complete);

    let details = OrientationRepo::find_by_id(&pool, orientation_id)
        .await
        .unwrap()
        .unwrap();
    assert!(details.consent_whatsapp);
    assert!(details.consent_voluntary);
    // Sync is disabled in tests, so no external row id lands.
    assert!(details.row_id.is_none());

    let today = chrono::Utc::now().date_naive();
    let record = AttendanceRepo::find_on(&pool, member_id, group_id, today)
        .await
        .unwrap()
        .expect("attendance row should exist");
    assert_eq!(record.member_id, Some(member_id));
    assert!(!record.is_no_email_check_in);
}

// ---------------------------------------------------------------------------
// Single-step intake
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn anonymous_intake_records_attendance_without_member(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Walk-ins", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());

    // Anonymous check-in issues the session the intake rides on.
    let check_in = post_json(
        app.clone(),
        "/api/v1/check-in",
        json!({ "groupId": group_id, "isNoEmail": true }),
    )
    .await;
    let cookie = extract_session_cookie(&check_in).expect("session cookie");

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/intake",
        &cookie,
        json!({ "isNoEmail": true, "firstName": "Ano", "lastName": "Nymous" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CHECKIN_COMPLETE");
    assert!(json["memberId"].is_null());

    let attendance_id = Uuid::parse_str(json["attendanceId"].as_str().unwrap()).unwrap();
    let (member_id, is_no_email, first_name): (Option<Uuid>, bool, Option<String>) =
        sqlx::query_as(
            "SELECT member_id, is_no_email_check_in, first_name \
             FROM attendance_register WHERE id = $1",
        )
        .bind(attendance_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(member_id, None);
    assert!(is_no_email);
    assert_eq!(first_name.as_deref(), Some("Ano"));

    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(members, 0, "anonymous intake must not create a member");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn email_intake_upserts_member_and_profile(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Walk-ins", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());

    let check_in = post_json(
        app.clone(),
        "/api/v1/check-in",
        json!({ "groupId": group_id, "isNoEmail": true }),
    )
    .await;
    let cookie = extract_session_cookie(&check_in).expect("session cookie");

    let response = post_json_with_cookie(
        app,
        "/api/v1/orientation/intake",
        &cookie,
        json!({
            "email": "intake@example.com",
            "firstName": "Zinhle",
            "lastName": "Dlamini",
            "gender": "Female",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CHECKIN_COMPLETE");
    assert!(json["memberId"].is_string());

    let member = MemberRepo::find_by_email(&pool, "intake@example.com")
        .await
        .unwrap()
        .expect("member should have been created");
    assert_eq!(member.first_name.as_deref(), Some("Zinhle"));
    assert_eq!(member.gender.as_deref(), Some("Female"));

    let today = chrono::Utc::now().date_naive();
    let record = AttendanceRepo::find_on(&pool, member.id, group_id, today)
        .await
        .unwrap()
        .expect("attendance row should exist");
    assert_eq!(record.first_name.as_deref(), Some("Zinhle"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn email_intake_same_day_twice_returns_409(pool: PgPool) {
    let group_id = seed_group(&pool, &in_person_group("Walk-ins", -33.93, 18.47, 4)).await;
    let app = common::build_test_app(pool.clone());

    let check_in = post_json(
        app.clone(),
        "/api/v1/check-in",
        json!({ "groupId": group_id, "isNoEmail": true }),
    )
    .await;
    let cookie = extract_session_cookie(&check_in).expect("session cookie");
    let body = json!({ "email": "repeat@example.com", "firstName": "Repeat" });

    let first = post_json_with_cookie(
        app.clone(),
        "/api/v1/orientation/intake",
        &cookie,
        body.clone(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    // The unique (member, group, date) index catches the second insert.
    let second = post_json_with_cookie(app, "/api/v1/orientation/intake", &cookie, body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "DUPLICATE_CHECKIN");
}
