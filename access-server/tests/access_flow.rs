//! End-to-end authorization flow tests: engine, repositories and a
//! counting door actuator over a tempdir RocksDB instance.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use access_server::access::AccessEngine;
use access_server::db::define_schema;
use access_server::db::repository::{AccessLogRepository, MemberRepository};
use access_server::reader::DoorActuator;
use shared::models::{
    AccessLogQuery, AccessOutcome, AccessReason, MemberCreate, MemberUpdate, PaymentMethod,
    PlanType,
};

struct CountingActuator(AtomicUsize);

impl CountingActuator {
    fn new() -> Arc<Self> {
        Arc::new(Self(AtomicUsize::new(0)))
    }

    fn pulses(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl DoorActuator for CountingActuator {
    fn open_door(&self) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        true
    }
}

struct Fixture {
    db: Surreal<Db>,
    members: MemberRepository,
    access_logs: AccessLogRepository,
    engine: AccessEngine,
    actuator: Arc<CountingActuator>,
}

async fn fixture(dir: &tempfile::TempDir) -> Fixture {
    let path = dir.path().join("test.db").to_string_lossy().to_string();
    let db = Surreal::new::<RocksDb>(path).await.unwrap();
    db.use_ns("gym").use_db("access").await.unwrap();
    define_schema(&db).await.unwrap();

    let members = MemberRepository::new(db.clone());
    let access_logs = AccessLogRepository::new(db.clone());
    let actuator = CountingActuator::new();
    let engine = AccessEngine::new(members.clone(), access_logs.clone(), actuator.clone());

    Fixture {
        db,
        members,
        access_logs,
        engine,
        actuator,
    }
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
        payment_method: PaymentMethod::Card,
        card_uid: card_uid.map(str::to_string),
    }
}

async fn expire_plan(fx: &Fixture, member_id: i64) {
    let yesterday = chrono::Local::now().date_naive() - Duration::days(1);
    fx.db
        .query("UPDATE member SET plan_end = $end WHERE member_id = $member_id")
        .bind(("end", yesterday))
        .bind(("member_id", member_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_card_is_denied_and_logged_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let result = fx.engine.process_access("DEADBEEF").await.unwrap();
    assert_eq!(result.outcome, AccessOutcome::Denied);
    assert_eq!(result.reason, AccessReason::NotFound);
    assert!(result.member.is_none());
    assert!(result.logged);
    assert_eq!(result.message, "Access denied: card not registered");
    assert_eq!(fx.actuator.pulses(), 0);

    let rows = fx
        .access_logs
        .query(&AccessLogQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].card_uid, "DEADBEEF");
    assert_eq!(rows[0].member_id, None);
    assert_eq!(rows[0].outcome, AccessOutcome::Denied);
    assert_eq!(rows[0].reason, AccessReason::NotFound);
}

#[tokio::test]
async fn valid_member_is_allowed_and_the_door_opens() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let ana = fx
        .members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();

    let result = fx.engine.process_access("AB12CD34").await.unwrap();
    assert_eq!(result.outcome, AccessOutcome::Allowed);
    assert_eq!(result.reason, AccessReason::Ok);
    assert_eq!(result.message, "Access granted: Ana Garcia");
    assert_eq!(fx.actuator.pulses(), 1);

    let rows = fx.access_logs.find_by_member(ana.id, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].member_id, Some(ana.id));
}

#[tokio::test]
async fn card_uid_is_trimmed_before_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    fx.members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();

    let result = fx.engine.process_access("  AB12CD34  ").await.unwrap();
    assert_eq!(result.outcome, AccessOutcome::Allowed);
    assert_eq!(result.card_uid, "AB12CD34");
}

#[tokio::test]
async fn inactive_member_is_denied_before_expiry_is_considered() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let ana = fx
        .members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    // Both inactive and expired; inactive must win
    expire_plan(&fx, ana.id).await;
    fx.members
        .update(
            ana.id,
            MemberUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = fx.engine.process_access("AB12CD34").await.unwrap();
    assert_eq!(result.outcome, AccessOutcome::Denied);
    assert_eq!(result.reason, AccessReason::Inactive);
    assert_eq!(result.message, "Access denied: Ana Garcia is inactive");
    assert_eq!(fx.actuator.pulses(), 0);
}

#[tokio::test]
async fn expired_plan_is_denied_with_the_end_date_in_the_message() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let ana = fx
        .members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    expire_plan(&fx, ana.id).await;

    let result = fx.engine.process_access("AB12CD34").await.unwrap();
    assert_eq!(result.outcome, AccessOutcome::Denied);
    assert_eq!(result.reason, AccessReason::Expired);
    assert!(result.message.starts_with("Access denied: plan for Ana Garcia expired on"));
    assert_eq!(fx.actuator.pulses(), 0);
}

#[tokio::test]
async fn check_access_is_side_effect_free() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    fx.members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();

    let result = fx.engine.check_access("AB12CD34").await.unwrap();
    assert_eq!(result.outcome, AccessOutcome::Allowed);
    assert!(!result.logged);
    assert_eq!(fx.actuator.pulses(), 0);
    assert_eq!(fx.access_logs.count().await.unwrap(), 0);
}

#[tokio::test]
async fn manual_access_logs_the_note_sentinel_and_opens_the_door() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let result = fx
        .engine
        .register_manual_access("  forgot card today, verified at desk  ")
        .await
        .unwrap();
    assert_eq!(result.outcome, AccessOutcome::Allowed);
    assert_eq!(result.reason, AccessReason::Manual);
    assert_eq!(fx.actuator.pulses(), 1);

    // Note is trimmed then capped at 20 characters
    assert_eq!(result.card_uid, "MANUAL-forgot card today, v");

    let rows = fx
        .access_logs
        .query(&AccessLogQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].card_uid, "MANUAL-forgot card today, v");
    assert_eq!(rows[0].member_id, None);
}

#[tokio::test]
async fn every_decision_satisfies_the_outcome_reason_pairing() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let ok = fx
        .members
        .create(new_member("Ana", "Garcia", Some("CARD0001")))
        .await
        .unwrap();
    let _ = ok;

    let inactive = fx
        .members
        .create(new_member("Bob", "Smith", Some("CARD0002")))
        .await
        .unwrap();
    fx.members
        .update(
            inactive.id,
            MemberUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let expired = fx
        .members
        .create(new_member("Eve", "Jones", Some("CARD0003")))
        .await
        .unwrap();
    expire_plan(&fx, expired.id).await;

    for card in ["CARD0001", "CARD0002", "CARD0003", "UNKNOWN0"] {
        let decision = fx.engine.decide(card).await.unwrap();
        assert_eq!(
            decision.reason.implied_outcome(),
            decision.outcome,
            "card {card} broke the pairing"
        );
    }
}

#[tokio::test]
async fn stats_report_the_allow_rate() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    fx.members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();

    for _ in 0..7 {
        fx.engine.process_access("AB12CD34").await.unwrap();
    }
    for _ in 0..3 {
        fx.engine.process_access("UNKNOWN0").await.unwrap();
    }

    let stats = fx
        .access_logs
        .stats(&AccessLogQuery::default())
        .await
        .unwrap();
    assert_eq!(stats.total, 10);
    assert_eq!(stats.allowed, 7);
    assert_eq!(stats.denied, 3);
    assert_eq!(stats.allow_rate, 70.0);
}

#[tokio::test]
async fn empty_log_stats_are_all_zero() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let stats = fx
        .access_logs
        .stats(&AccessLogQuery::default())
        .await
        .unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.allow_rate, 0.0);
}

#[tokio::test]
async fn log_queries_are_newest_first_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    for i in 0..5 {
        fx.engine
            .process_access(&format!("CARD{:04}", i))
            .await
            .unwrap();
    }

    let rows = fx
        .access_logs
        .query(&AccessLogQuery {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].timestamp >= rows[1].timestamp);

    let filtered = fx
        .access_logs
        .query(&AccessLogQuery {
            card_uid: Some("CARD0003".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);

    let denied = fx
        .access_logs
        .query(&AccessLogQuery {
            outcome: Some(AccessOutcome::Denied),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(denied.len(), 5);
}

#[tokio::test]
async fn deleting_a_member_leaves_log_rows_behind() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(&dir).await;

    let ana = fx
        .members
        .create(new_member("Ana", "Garcia", Some("AB12CD34")))
        .await
        .unwrap();
    fx.engine.process_access("AB12CD34").await.unwrap();
    fx.members.delete(ana.id).await.unwrap();

    let rows = fx
        .access_logs
        .query(&AccessLogQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].member_id, Some(ana.id));
    assert!(fx.members.find_by_id(ana.id).await.unwrap().is_none());
}
