//! Member repository integration tests against a tempdir RocksDB
//! instance.

use chrono::{Duration, NaiveDate};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use access_server::db::define_schema;
use access_server::db::repository::{MemberRepository, RepoError};
use shared::models::{MemberCreate, MemberSearch, MemberUpdate, PaymentMethod, PlanType};

async fn test_db(dir: &tempfile::TempDir) -> Surreal<Db> {
    let path = dir.path().join("test.db").to_string_lossy().to_string();
    let db = Surreal::new::<RocksDb>(path).await.unwrap();
    db.use_ns("gym").use_db("access").await.unwrap();
    define_schema(&db).await.unwrap();
    db
}

fn new_member(first: &str, last: &str, card_uid: Option<&str>) -> MemberCreate {
    MemberCreate {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: None,
        phone: None,
        notes: None,
        plan: PlanType::Monthly,
        plan_start: chrono::Local::now().date_naive(),
        payment_method: PaymentMethod::Cash,
        card_uid: card_uid.map(str::to_string),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Force a stored plan end date, bypassing the derived-at-write rule.
async fn force_plan_end(db: &Surreal<Db>, member_id: i64, end: NaiveDate) {
    db.query("UPDATE member SET plan_end = $end WHERE member_id = $member_id")
        .bind(("end", end))
        .bind(("member_id", member_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn create_and_lookup_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let created = repo
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    assert!(created.is_active);
    assert_eq!(created.full_name(), "Ana Garcia");
    assert_eq!(created.card_uid.as_deref(), Some("AB12CD34"));

    let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.id, created.id);

    let by_card = repo.find_by_card_uid("AB12CD34").await.unwrap().unwrap();
    assert_eq!(by_card.id, created.id);

    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn plan_end_is_derived_from_start_and_plan() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let mut payload = new_member("Ana", "Garcia", None);
    payload.plan = PlanType::Quarterly;
    payload.plan_start = date(2026, 1, 10);
    let created = repo.create(payload).await.unwrap();
    assert_eq!(created.plan_end, date(2026, 4, 10));
}

#[tokio::test]
async fn duplicate_card_is_rejected_naming_the_holder() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    repo.create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    let bob = repo.create(new_member("Bob", "Smith", None)).await.unwrap();

    let err = repo.assign_card(bob.id, "AB12CD34").await.unwrap_err();
    match err {
        RepoError::Duplicate(msg) => assert!(msg.contains("Ana Garcia"), "message was: {msg}"),
        other => panic!("expected Duplicate, got {other:?}"),
    }

    // Creating with an already-bound card fails the same way
    let err = repo
        .create(new_member("Eve", "Jones", Some("AB12CD34")))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn reassigning_own_card_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let ana = repo
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    let again = repo.assign_card(ana.id, "AB12CD34").await.unwrap();
    assert_eq!(again.card_uid.as_deref(), Some("AB12CD34"));
}

#[tokio::test]
async fn card_uid_is_stored_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let ana = repo.create(new_member("Ana", "Garcia", None)).await.unwrap();
    let updated = repo.assign_card(ana.id, "  AB12CD34  ").await.unwrap();
    assert_eq!(updated.card_uid.as_deref(), Some("AB12CD34"));
    assert!(repo.find_by_card_uid("AB12CD34").await.unwrap().is_some());
}

#[tokio::test]
async fn removing_an_absent_card_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let ana = repo
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();

    let removed = repo.remove_card(ana.id).await.unwrap();
    assert!(removed.card_uid.is_none());

    // Second removal succeeds without changing anything
    let removed_again = repo.remove_card(ana.id).await.unwrap();
    assert!(removed_again.card_uid.is_none());

    // The card is free for someone else now
    let bob = repo.create(new_member("Bob", "Smith", None)).await.unwrap();
    let bob = repo.assign_card(bob.id, "AB12CD34").await.unwrap();
    assert_eq!(bob.card_uid.as_deref(), Some("AB12CD34"));
}

#[tokio::test]
async fn update_recomputes_plan_end_only_when_plan_or_start_changes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let mut payload = new_member("Ana", "Garcia", None);
    payload.plan_start = date(2026, 1, 10);
    let ana = repo.create(payload).await.unwrap();
    assert_eq!(ana.plan_end, date(2026, 2, 10));

    // Unrelated update leaves the end date alone
    let ana = repo
        .update(
            ana.id,
            MemberUpdate {
                notes: Some("prefers mornings".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ana.plan_end, date(2026, 2, 10));
    assert_eq!(ana.notes.as_deref(), Some("prefers mornings"));

    // Plan change recomputes from the stored start date
    let ana = repo
        .update(
            ana.id,
            MemberUpdate {
                plan: Some(PlanType::Semiannual),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ana.plan_end, date(2026, 7, 10));
}

#[tokio::test]
async fn update_of_missing_member_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let err = repo
        .update(424242, MemberUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn blank_names_are_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let err = repo
        .create(new_member("   ", "Garcia", None))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn deactivate_expired_plans_flips_exactly_the_expired() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir).await;
    let repo = MemberRepository::new(db.clone());

    let today = chrono::Local::now().date_naive();
    let expired = repo.create(new_member("Ana", "Garcia", None)).await.unwrap();
    let edge = repo.create(new_member("Bob", "Smith", None)).await.unwrap();
    let valid = repo.create(new_member("Eve", "Jones", None)).await.unwrap();

    force_plan_end(&db, expired.id, today - Duration::days(1)).await;
    force_plan_end(&db, edge.id, today).await;
    force_plan_end(&db, valid.id, today + Duration::days(1)).await;

    assert_eq!(repo.deactivate_expired_plans().await.unwrap(), 1);

    assert!(!repo.find_by_id(expired.id).await.unwrap().unwrap().is_active);
    assert!(repo.find_by_id(edge.id).await.unwrap().unwrap().is_active);
    assert!(repo.find_by_id(valid.id).await.unwrap().unwrap().is_active);

    // Idempotent on the second run
    assert_eq!(repo.deactivate_expired_plans().await.unwrap(), 0);
}

#[tokio::test]
async fn search_filters_and_together() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let mut ana = new_member("Ana", "Garcia", None);
    ana.email = Some("ana@example.com".to_string());
    repo.create(ana).await.unwrap();

    let mut bob = new_member("Bob", "Smith", None);
    bob.plan = PlanType::Quarterly;
    let bob = repo.create(bob).await.unwrap();
    repo.update(
        bob.id,
        MemberUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Case-insensitive substring on names
    let hits = repo
        .search(&MemberSearch {
            first_name: Some("AN".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first_name, "Ana");

    // Plan filter alone finds Bob, ANDed with active_only it does not
    let hits = repo
        .search(&MemberSearch {
            plan: Some(PlanType::Quarterly),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let hits = repo
        .search(&MemberSearch {
            plan: Some(PlanType::Quarterly),
            active_only: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(hits.is_empty());

    // No filters returns everyone, name-ordered
    let all = repo.search(&MemberSearch::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].last_name, "Garcia");
    assert_eq!(all[1].last_name, "Smith");
}

#[tokio::test]
async fn delete_frees_the_card() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MemberRepository::new(test_db(&dir).await);

    let ana = repo
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    assert!(repo.delete(ana.id).await.unwrap());

    assert!(repo.find_by_id(ana.id).await.unwrap().is_none());
    assert!(repo.find_by_card_uid("AB12CD34").await.unwrap().is_none());

    let err = repo.delete(ana.id).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}
