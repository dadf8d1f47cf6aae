use super::common::*;

use crate::error::{Categorized, ErrorCategory};
use crate::workflows::grants::applications::{
    ApplicationId, ApplicationRepository, ApplicationServiceError, ApplicationStatus,
    BulkStatusChange, StatusChange, TransitionPolicy,
};
use crate::workflows::grants::domain::GrantId;

fn change(status: ApplicationStatus, remarks: Option<&str>) -> StatusChange {
    StatusChange {
        status,
        admin_remarks: remarks.map(str::to_string),
    }
}

#[test]
fn first_view_moves_pending_to_processing_once() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let farmer = fixture.farmer("farmer-a", 3, "X");
    let application = fixture.submitted(&grant, &farmer);

    let viewed = fixture
        .review
        .mark_viewed(application.id, "Ward officer")
        .expect("viewed");
    assert_eq!(viewed.status, ApplicationStatus::Processing);
    assert_eq!(viewed.updated_by.as_deref(), Some("Ward officer"));
    let stamped = viewed.updated_at;
    assert!(stamped.is_some());

    let again = fixture
        .review
        .mark_viewed(application.id, "Second officer")
        .expect("viewed again");
    assert_eq!(again.status, ApplicationStatus::Processing);
    assert_eq!(again.updated_at, stamped);
    assert_eq!(again.updated_by.as_deref(), Some("Ward officer"));
}

#[test]
fn viewing_a_decided_application_changes_nothing() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let farmer = fixture.farmer("farmer-a", 3, "X");
    let application = fixture.submitted(&grant, &farmer);
    fixture
        .review
        .update_status(application.id, change(ApplicationStatus::Rejected, None), "admin")
        .expect("rejected");

    let viewed = fixture
        .review
        .mark_viewed(application.id, "Ward officer")
        .expect("viewed");
    assert_eq!(viewed.status, ApplicationStatus::Rejected);
    assert_eq!(viewed.updated_by.as_deref(), Some("admin"));
}

#[test]
fn viewing_an_unknown_application_is_not_found() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let err = fixture
        .review
        .mark_viewed(ApplicationId(41), "admin")
        .expect_err("missing");
    assert!(matches!(err, ApplicationServiceError::NotFound(ApplicationId(41))));
}

#[test]
fn status_update_records_remarks_and_reviewer() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let farmer = fixture.farmer("farmer-a", 3, "X");
    let application = fixture.submitted(&grant, &farmer);

    let approved = fixture
        .review
        .update_status(
            application.id,
            change(ApplicationStatus::Approved, Some("Documents verified")),
            "Ward officer",
        )
        .expect("approved");
    assert_eq!(approved.status, ApplicationStatus::Approved);
    assert_eq!(approved.admin_remarks.as_deref(), Some("Documents verified"));
    assert_eq!(approved.updated_by.as_deref(), Some("Ward officer"));
}

#[test]
fn permissive_policy_allows_reopening_a_decision() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let farmer = fixture.farmer("farmer-a", 3, "X");
    let application = fixture.submitted(&grant, &farmer);
    fixture
        .review
        .update_status(application.id, change(ApplicationStatus::Approved, None), "admin")
        .expect("approved");

    let reopened = fixture
        .review
        .update_status(application.id, change(ApplicationStatus::Pending, None), "admin")
        .expect("reopened");
    assert_eq!(reopened.status, ApplicationStatus::Pending);
}

#[test]
fn enforced_policy_keeps_decisions_final() {
    let fixture = Fixture::new(TransitionPolicy::Enforced);
    let grant = fixture.grant();
    let farmer = fixture.farmer("farmer-a", 3, "X");
    let application = fixture.submitted(&grant, &farmer);
    fixture
        .review
        .update_status(application.id, change(ApplicationStatus::Approved, None), "admin")
        .expect("approved");

    let err = fixture
        .review
        .update_status(application.id, change(ApplicationStatus::Pending, None), "admin")
        .expect_err("final");
    assert!(matches!(err, ApplicationServiceError::Transition(_)));
    assert_eq!(err.category(), ErrorCategory::Conflict);
}

#[test]
fn bulk_update_skips_unknown_ids() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let first = fixture.submitted(&grant, &fixture.farmer("farmer-a", 3, "X"));
    let second = fixture.submitted(&grant, &fixture.farmer("farmer-b", 4, "X"));

    let updated = fixture
        .review
        .bulk_update_status(
            BulkStatusChange {
                application_ids: vec![first.id, ApplicationId(999), second.id, first.id],
                status: ApplicationStatus::Approved,
                admin_remarks: Some("Batch approval".to_string()),
            },
            "admin",
        )
        .expect("bulk");

    assert_eq!(updated.len(), 2);
    for id in [first.id, second.id] {
        let stored = fixture
            .store
            .fetch_application(id)
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.status, ApplicationStatus::Approved);
        assert_eq!(stored.admin_remarks.as_deref(), Some("Batch approval"));
    }
}

#[test]
fn bulk_update_without_matches_fails() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let err = fixture
        .review
        .bulk_update_status(
            BulkStatusChange {
                application_ids: vec![ApplicationId(7), ApplicationId(8)],
                status: ApplicationStatus::Rejected,
                admin_remarks: None,
            },
            "admin",
        )
        .expect_err("nothing matched");
    assert!(matches!(err, ApplicationServiceError::NoneMatched));
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[test]
fn enforced_bulk_update_is_all_or_nothing() {
    let fixture = Fixture::new(TransitionPolicy::Enforced);
    let grant = fixture.grant();
    let open = fixture.submitted(&grant, &fixture.farmer("farmer-a", 3, "X"));
    let decided = fixture.submitted(&grant, &fixture.farmer("farmer-b", 4, "X"));
    fixture
        .review
        .update_status(decided.id, change(ApplicationStatus::Rejected, None), "admin")
        .expect("rejected");

    let err = fixture
        .review
        .bulk_update_status(
            BulkStatusChange {
                application_ids: vec![open.id, decided.id],
                status: ApplicationStatus::Approved,
                admin_remarks: None,
            },
            "admin",
        )
        .expect_err("one row is final");
    assert!(matches!(err, ApplicationServiceError::Transition(_)));

    let untouched = fixture
        .store
        .fetch_application(open.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(untouched.status, ApplicationStatus::Pending);
}

#[test]
fn ai_score_must_be_finite() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let application = fixture.submitted(&grant, &fixture.farmer("farmer-a", 3, "X"));

    let err = fixture
        .review
        .attach_ai_score(application.id, f64::NAN)
        .expect_err("nan");
    assert!(matches!(err, ApplicationServiceError::InvalidScore));

    let scored = fixture
        .review
        .attach_ai_score(application.id, 64.5)
        .expect("scored");
    assert_eq!(scored.ai_score, Some(64.5));
    assert_eq!(scored.status, ApplicationStatus::Pending);
}

#[test]
fn grant_listing_filters_by_status() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let other_grant = fixture.grant_for(&[1], "Y");
    let first = fixture.submitted(&grant, &fixture.farmer("farmer-a", 3, "X"));
    let second = fixture.submitted(&grant, &fixture.farmer("farmer-b", 4, "X"));
    fixture.submitted(&other_grant, &fixture.farmer("farmer-c", 1, "Y"));
    fixture
        .review
        .update_status(second.id, change(ApplicationStatus::Approved, None), "admin")
        .expect("approved");

    let all = fixture.review.list_for_grant(grant.id, None).expect("all");
    assert_eq!(all.len(), 2);

    let pending = fixture
        .review
        .list_for_grant(grant.id, Some(ApplicationStatus::Pending))
        .expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let missing = fixture
        .review
        .list_for_grant(GrantId(404), None)
        .expect_err("unknown grant");
    assert!(matches!(missing, ApplicationServiceError::GrantUnavailable(_)));
}

#[test]
fn admin_listing_includes_grant_headline() {
    let fixture = Fixture::new(TransitionPolicy::Permissive);
    let grant = fixture.grant();
    let application = fixture.submitted(&grant, &fixture.farmer("farmer-a", 3, "X"));

    let listed = fixture.review.list_all().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].grant_amount, Some(25000.0));

    let view = fixture.review.get(application.id).expect("get");
    assert_eq!(view.grant_title.as_deref(), Some("Irrigation support"));
}
