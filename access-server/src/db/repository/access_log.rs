//! Access Log Repository
//!
//! Append-only: only `append` and read methods exist. No update or
//! delete interface, and member deletion never touches this table.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::models::{AccessLogEntry, AccessLogQuery, AccessOutcome, AccessReason, AccessStats};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoResult};

/// Default row cap when a query carries no explicit limit
pub const DEFAULT_QUERY_LIMIT: usize = 500;

/// Insert shape (no SurrealDB record id)
#[derive(Debug, Serialize)]
struct AccessLogInsert {
    log_id: i64,
    timestamp: i64,
    card_uid: String,
    member_id: Option<i64>,
    outcome: AccessOutcome,
    reason: AccessReason,
}

/// Deserialization shape (carries the SurrealDB record id)
#[derive(Debug, Deserialize)]
struct AccessLogRecord {
    #[allow(dead_code)]
    id: surrealdb::RecordId,
    log_id: i64,
    timestamp: i64,
    card_uid: String,
    member_id: Option<i64>,
    outcome: AccessOutcome,
    reason: AccessReason,
}

impl From<AccessLogRecord> for AccessLogEntry {
    fn from(r: AccessLogRecord) -> Self {
        AccessLogEntry {
            id: r.log_id,
            timestamp: r.timestamp,
            card_uid: r.card_uid,
            member_id: r.member_id,
            outcome: r.outcome,
            reason: r.reason,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountResult {
    total: u64,
}

/// Access log storage (SurrealDB)
#[derive(Clone)]
pub struct AccessLogRepository {
    base: BaseRepository,
    /// Serializes appends so id allocation and insert stay one step
    append_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AccessLogRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
            append_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Record one access attempt. The timestamp is taken here, never
    /// supplied by the caller.
    pub async fn append(
        &self,
        card_uid: &str,
        outcome: AccessOutcome,
        reason: AccessReason,
        member_id: Option<i64>,
    ) -> RepoResult<AccessLogEntry> {
        let _guard = self.append_lock.lock().await;

        let insert = AccessLogInsert {
            log_id: shared::util::snowflake_id(),
            timestamp: shared::util::now_millis(),
            card_uid: card_uid.to_string(),
            member_id,
            outcome,
            reason,
        };

        let mut res = self
            .base
            .db()
            .query("CREATE access_log CONTENT $data")
            .bind(("data", insert))
            .await?;
        let created: Vec<AccessLogRecord> = res.take(0)?;

        created
            .into_iter()
            .next()
            .map(AccessLogEntry::from)
            .ok_or_else(|| super::RepoError::Database("Insert returned no row".to_string()))
    }

    /// Filtered query, newest first
    pub async fn query(&self, q: &AccessLogQuery) -> RepoResult<Vec<AccessLogEntry>> {
        let mut conditions = Vec::new();

        if q.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if q.to.is_some() {
            conditions.push("timestamp <= $to");
        }
        if q.outcome.is_some() {
            conditions.push("outcome = $outcome");
        }
        if q.member_id.is_some() {
            conditions.push("member_id = $member_id");
        }
        if q.card_uid.is_some() {
            conditions.push("card_uid CONTAINS $card_uid");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let limit = q.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        let sql = format!(
            "SELECT * FROM access_log{} ORDER BY timestamp DESC LIMIT {}",
            where_clause, limit
        );

        let mut qb = self.base.db().query(sql);

        if let Some(from) = q.from {
            qb = qb.bind(("from", from));
        }
        if let Some(to) = q.to {
            qb = qb.bind(("to", to));
        }
        if let Some(outcome) = q.outcome {
            qb = qb.bind(("outcome", outcome));
        }
        if let Some(member_id) = q.member_id {
            qb = qb.bind(("member_id", member_id));
        }
        if let Some(ref card_uid) = q.card_uid {
            qb = qb.bind(("card_uid", card_uid.clone()));
        }

        let mut result = qb.await?;
        let records: Vec<AccessLogRecord> = result.take(0)?;
        Ok(records.into_iter().map(AccessLogEntry::from).collect())
    }

    /// Latest `limit` entries, no filter
    pub async fn recent(&self, limit: usize) -> RepoResult<Vec<AccessLogEntry>> {
        self.query(&AccessLogQuery {
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }

    /// Entries for one member, newest first
    pub async fn find_by_member(
        &self,
        member_id: i64,
        limit: usize,
    ) -> RepoResult<Vec<AccessLogEntry>> {
        self.query(&AccessLogQuery {
            member_id: Some(member_id),
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }

    /// Aggregate counters over the same filters as `query` (the row
    /// cap does not apply to counting).
    pub async fn stats(&self, q: &AccessLogQuery) -> RepoResult<AccessStats> {
        let mut conditions = Vec::new();

        if q.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if q.to.is_some() {
            conditions.push("timestamp <= $to");
        }
        if q.member_id.is_some() {
            conditions.push("member_id = $member_id");
        }
        if q.card_uid.is_some() {
            conditions.push("card_uid CONTAINS $card_uid");
        }

        let base_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let allowed_clause = if conditions.is_empty() {
            " WHERE outcome = $allowed".to_string()
        } else {
            format!(" WHERE {} AND outcome = $allowed", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT count() AS total FROM access_log{} GROUP ALL; \
             SELECT count() AS total FROM access_log{} GROUP ALL",
            base_clause, allowed_clause
        );

        let mut qb = self
            .base
            .db()
            .query(sql)
            .bind(("allowed", AccessOutcome::Allowed));

        if let Some(from) = q.from {
            qb = qb.bind(("from", from));
        }
        if let Some(to) = q.to {
            qb = qb.bind(("to", to));
        }
        if let Some(member_id) = q.member_id {
            qb = qb.bind(("member_id", member_id));
        }
        if let Some(ref card_uid) = q.card_uid {
            qb = qb.bind(("card_uid", card_uid.clone()));
        }

        let mut result = qb.await?;
        let total_rows: Vec<CountResult> = result.take(0)?;
        let allowed_rows: Vec<CountResult> = result.take(1)?;

        let total = total_rows.first().map(|c| c.total).unwrap_or(0);
        let allowed = allowed_rows.first().map(|c| c.total).unwrap_or(0);
        let denied = total - allowed;
        let allow_rate = if total == 0 {
            0.0
        } else {
            (allowed as f64 / total as f64 * 10_000.0).round() / 100.0
        };

        Ok(AccessStats {
            total,
            allowed,
            denied,
            allow_rate,
        })
    }

    /// Total row count
    pub async fn count(&self) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM access_log GROUP ALL")
            .await?;
        let rows: Vec<CountResult> = result.take(0)?;
        Ok(rows.first().map(|c| c.total).unwrap_or(0))
    }
}
