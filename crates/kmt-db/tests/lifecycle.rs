//! End-to-end request lifecycle scenarios against a real libSQL database.

use chrono::{Duration, Utc};
use kmt_core::entities::{NewRequest, RequestItem};
use kmt_core::enums::{AuditAction, RequestCategory, RequestStatus, Role};
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;
use kmt_db::KmtDb;
use kmt_db::error::DatabaseError;
use kmt_db::repos::audit::AuditFilter;
use kmt_db::repos::request::RequestFilter;
use kmt_db::service::KmtService;
use pretty_assertions::assert_eq;

fn admin() -> Actor {
    Actor::new("usr-admin", Role::Admin, None)
}

fn rustaq_supervisor() -> Actor {
    Actor::new("usr-sup-rustaq", Role::Supervisor, Some("Rustaq"))
}

fn ali() -> Actor {
    Actor::new("usr-ali", Role::Staff, Some("Rustaq"))
}

fn ring_spanner() -> NewRequest {
    NewRequest::new(
        "Rustaq",
        RequestCategory::Material,
        vec![RequestItem::named("Ring spanner 10", 1)],
    )
}

async fn service() -> KmtService {
    KmtService::new_local(":memory:").await.unwrap()
}

async fn audit_for(svc: &KmtService, id: &str) -> Vec<kmt_core::entities::AuditEntry> {
    svc.query_audit(
        &admin(),
        &AuditFilter {
            target_request_id: Some(id.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn ring_spanner_from_submission_to_completion() {
    let svc = service().await;
    let sup = rustaq_supervisor();

    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    assert_eq!(req.status, RequestStatus::Pending);

    let accepted = svc.accept_request(&sup, &req.id).await.unwrap();
    assert_eq!(accepted.status, RequestStatus::InProgress);
    assert_eq!(accepted.assigned_supervisor_id.as_deref(), Some(sup.id.as_str()));

    let handed_over_at = Utc::now();
    let done = svc
        .complete_request(&sup, &req.id, "Ali", handed_over_at)
        .await
        .unwrap();
    assert_eq!(done.status, RequestStatus::Completed);
    assert_eq!(done.received_by.as_deref(), Some("Ali"));
    assert!(done.completed_at.is_some());

    let completed: Vec<_> = audit_for(&svc, &req.id)
        .await
        .into_iter()
        .filter(|e| e.action == AuditAction::Completed)
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].actor_id, sup.id);
}

#[tokio::test]
async fn every_transition_adds_one_audit_entry_after_prior_update() {
    let svc = service().await;
    let sup = rustaq_supervisor();
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();

    let mut previous = req.clone();
    let steps: Vec<(AuditAction, kmt_core::entities::MaterialRequest)> = vec![
        (
            AuditAction::Accepted,
            svc.accept_request(&sup, &req.id).await.unwrap(),
        ),
        (
            AuditAction::Assigned,
            svc.reassign_request(&admin(), &req.id).await.unwrap(),
        ),
        (
            AuditAction::Accepted,
            svc.accept_request(&sup, &req.id).await.unwrap(),
        ),
        (
            AuditAction::Completed,
            svc.complete_request(&sup, &req.id, "Ali", Utc::now())
                .await
                .unwrap(),
        ),
    ];

    let entries = audit_for(&svc, &req.id).await;
    // submitted + one per step
    assert_eq!(entries.len(), 1 + steps.len());

    // entries are newest first; walk them oldest first alongside the steps
    let mut chronological = entries.into_iter().rev().skip(1);
    for (action, after) in steps {
        let entry = chronological.next().unwrap();
        assert_eq!(entry.action, action);
        assert_eq!(entry.target_request_id, req.id);
        assert!(entry.created_at >= previous.updated_at);
        assert_eq!(entry.created_at, after.updated_at);
        previous = after;
    }
}

#[tokio::test]
async fn pending_cannot_jump_to_completed() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    let err = svc
        .complete_request(&admin(), &req.id, "Ali", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(CoreError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn completion_before_creation_is_rejected() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    svc.accept_request(&admin(), &req.id).await.unwrap();
    let err = svc
        .complete_request(&admin(), &req.id, "Ali", req.created_at - Duration::days(1))
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(CoreError::Validation(_))));
}

#[tokio::test]
async fn soft_deleted_request_leaves_every_active_view() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    svc.soft_delete(&admin(), &req.id).await.unwrap();

    for filter in [
        RequestFilter::default(),
        RequestFilter {
            area: Some("Rustaq".into()),
            ..Default::default()
        },
        RequestFilter {
            status: Some(RequestStatus::Pending),
            ..Default::default()
        },
    ] {
        let listed = svc.list_active(&admin(), &filter).await.unwrap();
        assert!(listed.iter().all(|r| r.id != req.id));
    }

    let err = svc
        .accept_request(&rustaq_supervisor(), &req.id)
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn delete_then_recover_is_lossless() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    let before = svc.get_request(&admin(), &req.id).await.unwrap();

    svc.soft_delete(&admin(), &req.id).await.unwrap();
    svc.recover(&admin(), &req.id).await.unwrap();

    assert_eq!(svc.get_request(&admin(), &req.id).await.unwrap(), before);
    let actions: Vec<AuditAction> = audit_for(&svc, &req.id)
        .await
        .iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Recovered,
            AuditAction::Deleted,
            AuditAction::Submitted
        ]
    );
}

#[tokio::test]
async fn purge_then_recover_is_not_deleted() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    svc.soft_delete(&admin(), &req.id).await.unwrap();
    svc.purge(&admin(), &req.id).await.unwrap();

    let err = svc.recover(&admin(), &req.id).await.unwrap_err();
    assert!(matches!(err.domain(), Some(CoreError::NotDeleted { .. })));
    assert!(svc.list_deleted(&admin()).await.unwrap().is_empty());
    // the audit trail outlives the row
    assert_eq!(audit_for(&svc, &req.id).await.len(), 3);
}

#[tokio::test]
async fn claimed_request_rejects_concurrent_mutation() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();

    // the accept is mid-flight while the admin tries to delete
    let in_flight = svc.claims().try_claim(&req.id).unwrap();
    let err = svc.soft_delete(&admin(), &req.id).await.unwrap_err();
    assert!(matches!(err.domain(), Some(CoreError::Conflict { .. })));
    assert!(err.is_retryable());
    drop(in_flight);

    // after release the delete goes through
    svc.soft_delete(&admin(), &req.id).await.unwrap();
}

#[tokio::test]
async fn racing_accept_and_delete_stay_consistent() {
    let svc = service().await;
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();

    let supervisor = rustaq_supervisor();
    let admin_actor = admin();
    let (accepted, deleted) = tokio::join!(
        svc.accept_request(&supervisor, &req.id),
        svc.soft_delete(&admin_actor, &req.id)
    );
    assert!(accepted.is_ok() || deleted.is_ok(), "one of them must win");
    for err in [accepted.as_ref().err(), deleted.as_ref().err()]
        .into_iter()
        .flatten()
    {
        assert!(
            matches!(
                err.domain(),
                Some(CoreError::Conflict { .. } | CoreError::NotFound { .. })
            ),
            "unexpected error: {err}"
        );
    }

    let actions: Vec<AuditAction> = audit_for(&svc, &req.id)
        .await
        .iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions.contains(&AuditAction::Accepted),
        accepted.is_ok()
    );
    assert_eq!(actions.contains(&AuditAction::Deleted), deleted.is_ok());

    let deleted_rows = svc.list_deleted(&admin()).await.unwrap();
    assert_eq!(deleted_rows.len(), usize::from(deleted.is_ok()));
    if let Some(row) = deleted_rows.first() {
        let expected = if accepted.is_ok() {
            RequestStatus::InProgress
        } else {
            RequestStatus::Pending
        };
        assert_eq!(row.status, expected);
    }
}

#[tokio::test]
async fn state_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kmt.db");
    let path = path.to_str().unwrap();

    let id = {
        let svc = KmtService::new_local(path).await.unwrap();
        let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
        svc.accept_request(&rustaq_supervisor(), &req.id)
            .await
            .unwrap();
        req.id
    };

    let svc = KmtService::new_local(path).await.unwrap();
    let req = svc.get_request(&ali(), &id).await.unwrap();
    assert_eq!(req.status, RequestStatus::InProgress);
    assert_eq!(audit_for(&svc, &id).await.len(), 2);
}

#[tokio::test]
async fn completion_time_round_trips_through_storage() {
    let svc = service().await;
    let sup = rustaq_supervisor();
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    svc.accept_request(&sup, &req.id).await.unwrap();

    let done = svc
        .complete_request(&sup, &req.id, "Ali", Utc::now() + Duration::nanoseconds(123))
        .await
        .unwrap();
    let fetched = svc.get_request(&ali(), &req.id).await.unwrap();
    assert_eq!(done, fetched);

    let completed = audit_for(&svc, &req.id).await.remove(0);
    assert_eq!(completed.action, AuditAction::Completed);
    let meta = completed.meta.unwrap();
    let logged: chrono::DateTime<Utc> =
        serde_json::from_value(meta["completed_at"].clone()).unwrap();
    assert_eq!(Some(logged), fetched.completed_at);
}

#[tokio::test]
async fn unrepresentable_completion_time_is_rejected() {
    use chrono::TimeZone;

    let svc = service().await;
    let sup = rustaq_supervisor();
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();
    svc.accept_request(&sup, &req.id).await.unwrap();

    let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    let err = svc
        .complete_request(&sup, &req.id, "Ali", far)
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(CoreError::Validation(_))));

    // nothing was written, so reads keep working
    let active = svc
        .list_active(&admin(), &RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, RequestStatus::InProgress);
}

#[tokio::test]
async fn writer_in_another_handle_yields_retryable_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kmt.db");
    let path = path.to_str().unwrap();

    let svc = KmtService::new_local(path).await.unwrap();
    let req = svc.create_request(&ali(), &ring_spanner()).await.unwrap();

    let other = KmtDb::open_local(path).await.unwrap();
    let tx = other.begin_write("mat-held").await.unwrap();
    tx.execute(
        "INSERT INTO materials (id, name, created_at) VALUES ('mat-held', 'Gloves', '2025-11-15T08:00:00.000000Z')",
        (),
    )
    .await
    .unwrap();

    let err = svc
        .accept_request(&rustaq_supervisor(), &req.id)
        .await
        .unwrap_err();
    assert!(
        matches!(err.domain(), Some(CoreError::Conflict { id }) if *id == req.id),
        "unexpected error: {err}"
    );
    assert!(err.is_retryable());

    let released: Result<(), DatabaseError> = Err(DatabaseError::NoResult);
    assert!(tx.finish(released).await.is_err());

    let accepted = svc
        .accept_request(&rustaq_supervisor(), &req.id)
        .await
        .unwrap();
    assert_eq!(accepted.status, RequestStatus::InProgress);
}
