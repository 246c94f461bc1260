//! Attendance check-in integration tests
//!
//! Token issuance, redemption, reporting and the present list.

mod helpers;

use assert_matches::assert_matches;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{TimeZone, Utc};

use gatherly::models::{ParticipantStatus, Visibility};
use gatherly::GatherlyError;

use helpers::setup;

struct CheckinFixture {
    ctx: helpers::TestContext,
    owner: gatherly::models::User,
    staff: gatherly::models::User,
    guest: gatherly::models::User,
    event: gatherly::models::Event,
}

/// Active event with a collaborator (staff) and a confirmed guest
async fn active_event_fixture() -> CheckinFixture {
    let ctx = setup();
    let owner = ctx.create_user("Alice").await;
    let staff = ctx.create_user("Bob").await;
    let guest = ctx.create_user("Carol").await;
    let event = ctx.create_event(&owner, Visibility::Public).await;

    ctx.services
        .participant_service
        .join_public(event.id, staff.id)
        .await
        .unwrap();
    ctx.services
        .participant_service
        .join_public(event.id, guest.id)
        .await
        .unwrap();
    ctx.services
        .participant_service
        .promote_collaborator(event.id, staff.id, owner.id)
        .await
        .unwrap();
    ctx.services
        .participant_service
        .confirm_participant(event.id, guest.id, guest.id)
        .await
        .unwrap();

    let event = ctx.start_event(&event).await;
    CheckinFixture {
        ctx,
        owner,
        staff,
        guest,
        event,
    }
}

#[tokio::test]
async fn test_issue_token_requires_active_event() {
    let ctx = setup();
    let owner = ctx.create_user("Alice").await;
    let event = ctx.create_event(&owner, Visibility::Public).await;

    let err = ctx
        .services
        .checkin_service
        .issue_token(event.id, owner.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::InvalidState { .. });
}

#[tokio::test]
async fn test_issue_token_requires_membership() {
    let f = active_event_fixture().await;
    let outsider = f.ctx.create_user("Mallory").await;

    let err = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, outsider.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::NotParticipating { .. });
}

#[tokio::test]
async fn test_issued_token_shape_and_image() {
    let f = active_event_fixture().await;

    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();

    assert_eq!(pass.token.len(), 6);
    assert!(pass.token.bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(pass.event_name, f.event.name);

    let image = BASE64.decode(pass.qr_image_base64.as_bytes()).unwrap();
    let svg = String::from_utf8(image).unwrap();
    assert!(svg.contains("<svg"));
}

#[tokio::test]
async fn test_redeem_token_marks_present_then_conflicts() {
    let f = active_event_fixture().await;
    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();

    let confirmation = f
        .ctx
        .services
        .checkin_service
        .redeem_token(&pass.token, f.staff.id)
        .await
        .unwrap();
    assert_eq!(confirmation.status, ParticipantStatus::Present);
    assert_eq!(confirmation.user_id, f.guest.id);
    assert_eq!(confirmation.user_email, "carol@example.com");

    // Redeeming the same token again is a conflict, not a transition
    let err = f
        .ctx
        .services
        .checkin_service
        .redeem_token(&pass.token, f.staff.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::AlreadyPresent { .. });

    // No duplicate history entry was appended by the failed redemption
    let row = gatherly::database::store::ParticipantStore::find_by_event_and_user(
        f.ctx.store.as_ref(),
        f.event.id,
        f.guest.id,
    )
    .await
    .unwrap()
    .unwrap();
    // Created (Invited) + confirm + present transitions
    assert_eq!(row.history.len(), 3);
}

#[tokio::test]
async fn test_redeem_validates_format_before_lookup() {
    let f = active_event_fixture().await;

    for bad in ["", "12345", "1234567", "12a456", "482 913"] {
        let err = f
            .ctx
            .services
            .checkin_service
            .redeem_token(bad, f.staff.id)
            .await
            .unwrap_err();
        assert_matches!(err, GatherlyError::Validation(_), "token {bad:?}");
    }

    // Leading/trailing whitespace is tolerated
    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();
    let padded = format!("  {}  ", pass.token);
    assert!(f
        .ctx
        .services
        .checkin_service
        .redeem_token(&padded, f.staff.id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_redeem_unknown_token() {
    let f = active_event_fixture().await;

    let err = f
        .ctx
        .services
        .checkin_service
        .redeem_token("000000", f.staff.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::TokenNotFound);
}

#[tokio::test]
async fn test_redeem_forbidden_for_plain_participants() {
    let f = active_event_fixture().await;
    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();

    // The guest holds the token but has no staff role
    let err = f
        .ctx
        .services
        .checkin_service
        .redeem_token(&pass.token, f.guest.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::Forbidden(_));
}

#[tokio::test]
async fn test_redeem_rejected_after_event_finishes() {
    let f = active_event_fixture().await;
    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();

    f.ctx
        .services
        .event_service
        .finish_event(f.event.id, f.owner.id)
        .await
        .unwrap();

    let err = f
        .ctx
        .services
        .checkin_service
        .redeem_token(&pass.token, f.staff.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::Validation(_));
}

#[tokio::test]
async fn test_reissue_invalidates_previous_token() {
    let f = active_event_fixture().await;

    let first = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();
    let second = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();

    if first.token != second.token {
        let err = f
            .ctx
            .services
            .checkin_service
            .redeem_token(&first.token, f.staff.id)
            .await
            .unwrap_err();
        assert_matches!(err, GatherlyError::TokenNotFound);
    }

    assert!(f
        .ctx
        .services
        .checkin_service
        .redeem_token(&second.token, f.staff.id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_attendance_report_partitions_participants() {
    let f = active_event_fixture().await;

    // Owner was auto-marked present on start; check the guest in too
    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();
    f.ctx
        .services
        .checkin_service
        .redeem_token(&pass.token, f.staff.id)
        .await
        .unwrap();

    let report = f
        .ctx
        .services
        .checkin_service
        .attendance_report(f.event.id, f.owner.id)
        .await
        .unwrap();

    assert_eq!(report.total_participants, 3);
    assert_eq!(report.present_count, 2);
    assert_eq!(report.absent_count, 1);
    assert!(report
        .present
        .iter()
        .any(|summary| summary.user_id == f.guest.id));
    assert!(report
        .absent
        .iter()
        .any(|summary| summary.user_id == f.staff.id && summary.is_collaborator));
}

#[tokio::test]
async fn test_attendance_report_forbidden_for_guests() {
    let f = active_event_fixture().await;

    let err = f
        .ctx
        .services
        .checkin_service
        .attendance_report(f.event.id, f.guest.id)
        .await
        .unwrap_err();
    assert_matches!(err, GatherlyError::Forbidden(_));
}

#[tokio::test]
async fn test_present_participants_carries_scan_time() {
    let f = active_event_fixture().await;

    let pass = f
        .ctx
        .services
        .checkin_service
        .issue_token(f.event.id, f.guest.id)
        .await
        .unwrap();
    f.ctx
        .clock
        .set(Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap());
    f.ctx
        .services
        .checkin_service
        .redeem_token(&pass.token, f.staff.id)
        .await
        .unwrap();

    let present = f
        .ctx
        .services
        .checkin_service
        .present_participants(f.event.id, f.staff.id)
        .await
        .unwrap();

    let guest_entry = present
        .iter()
        .find(|entry| entry.user_id == f.guest.id)
        .expect("guest present");
    assert_eq!(guest_entry.status, ParticipantStatus::Present);
    assert_eq!(
        guest_entry.scanned_at,
        Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap())
    );
}
