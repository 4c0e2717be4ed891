//! Member Repository
//!
//! Every mutation runs under a store-level write lock so that card
//! uniqueness checks and the write they guard are atomic. Reads take no
//! lock.

use std::sync::Arc;

use chrono::NaiveDate;
use shared::models::{Member, MemberCreate, MemberSearch, MemberUpdate, PaymentMethod, PlanType};
use shared::util::{now_millis, snowflake_id};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::access::plan;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};

/// Insert/replace payload (no SurrealDB record id)
#[derive(Debug, serde::Serialize)]
struct MemberInsert {
    member_id: i64,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    plan: PlanType,
    plan_start: NaiveDate,
    plan_end: NaiveDate,
    payment_method: PaymentMethod,
    card_uid: Option<String>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<&Member> for MemberInsert {
    fn from(m: &Member) -> Self {
        Self {
            member_id: m.id,
            first_name: m.first_name.clone(),
            last_name: m.last_name.clone(),
            email: m.email.clone(),
            phone: m.phone.clone(),
            notes: m.notes.clone(),
            plan: m.plan,
            plan_start: m.plan_start,
            plan_end: m.plan_end,
            payment_method: m.payment_method,
            card_uid: m.card_uid.clone(),
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// SurrealDB row (includes the engine's record id)
#[derive(Debug, Clone, serde::Deserialize)]
struct MemberRecord {
    id: surrealdb::RecordId,
    member_id: i64,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    plan: PlanType,
    plan_start: NaiveDate,
    plan_end: NaiveDate,
    payment_method: PaymentMethod,
    card_uid: Option<String>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<MemberRecord> for Member {
    fn from(r: MemberRecord) -> Self {
        Member {
            id: r.member_id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            notes: r.notes,
            plan: r.plan,
            plan_start: r.plan_start,
            plan_end: r.plan_end,
            payment_method: r.payment_method,
            card_uid: r.card_uid,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// COUNT result row
#[derive(Debug, serde::Deserialize)]
struct CountResult {
    total: u64,
}

#[derive(Clone)]
pub struct MemberRepository {
    base: BaseRepository,
    /// Serializes all mutations; uniqueness check + write are atomic per operation
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl MemberRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// All members ordered by last then first name
    pub async fn find_all(&self) -> RepoResult<Vec<Member>> {
        let records: Vec<MemberRecord> = self
            .base
            .db()
            .query("SELECT * FROM member ORDER BY last_name ASC, first_name ASC")
            .await?
            .take(0)?;
        Ok(records.into_iter().map(Member::from).collect())
    }

    pub async fn find_by_id(&self, member_id: i64) -> RepoResult<Option<Member>> {
        Ok(self
            .find_record_by_id(member_id)
            .await?
            .map(Member::from))
    }

    pub async fn find_by_card_uid(&self, card_uid: &str) -> RepoResult<Option<Member>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM member WHERE card_uid = $card_uid LIMIT 1")
            .bind(("card_uid", card_uid.to_string()))
            .await?;
        let records: Vec<MemberRecord> = result.take(0)?;
        Ok(records.into_iter().next().map(Member::from))
    }

    /// Filtered search; every present filter is ANDed
    pub async fn search(&self, filters: &MemberSearch) -> RepoResult<Vec<Member>> {
        let mut conditions = Vec::new();

        if filters.first_name.is_some() {
            conditions.push("string::lowercase(first_name) CONTAINS $first_name");
        }
        if filters.last_name.is_some() {
            conditions.push("string::lowercase(last_name) CONTAINS $last_name");
        }
        if filters.email.is_some() {
            conditions.push("string::lowercase(email) CONTAINS $email");
        }
        if filters.phone.is_some() {
            conditions.push("phone CONTAINS $phone");
        }
        if filters.notes.is_some() {
            conditions.push("string::lowercase(notes) CONTAINS $notes");
        }
        if filters.plan.is_some() {
            conditions.push("plan = $plan");
        }
        if filters.active_only == Some(true) {
            conditions.push("is_active = true");
        }
        if filters.vigent_only == Some(true) {
            conditions.push("plan_end >= $today");
        }
        if filters.end_from.is_some() {
            conditions.push("plan_end >= $end_from");
        }
        if filters.end_to.is_some() {
            conditions.push("plan_end <= $end_to");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM member{} ORDER BY last_name ASC, first_name ASC",
            where_clause
        );

        let mut qb = self.base.db().query(sql);
        if let Some(ref v) = filters.first_name {
            qb = qb.bind(("first_name", v.to_lowercase()));
        }
        if let Some(ref v) = filters.last_name {
            qb = qb.bind(("last_name", v.to_lowercase()));
        }
        if let Some(ref v) = filters.email {
            qb = qb.bind(("email", v.to_lowercase()));
        }
        if let Some(ref v) = filters.phone {
            qb = qb.bind(("phone", v.clone()));
        }
        if let Some(ref v) = filters.notes {
            qb = qb.bind(("notes", v.to_lowercase()));
        }
        if let Some(ref plan) = filters.plan {
            qb = qb.bind(("plan", *plan));
        }
        if filters.vigent_only == Some(true) {
            qb = qb.bind(("today", plan::today()));
        }
        if let Some(from) = filters.end_from {
            qb = qb.bind(("end_from", from));
        }
        if let Some(to) = filters.end_to {
            qb = qb.bind(("end_to", to));
        }

        let records: Vec<MemberRecord> = qb.await?.take(0)?;
        Ok(records.into_iter().map(Member::from).collect())
    }

    // ── Mutations (all under the write lock) ────────────────────────

    /// Create a member. The plan end date is derived here, never taken
    /// from the caller.
    pub async fn create(&self, data: MemberCreate) -> RepoResult<Member> {
        validate_create(&data)?;
        let card_uid = normalize_card_uid(data.card_uid.as_deref());

        let _guard = self.write_lock.lock().await;
        if let Some(ref uid) = card_uid {
            self.ensure_card_unbound(uid, None).await?;
        }

        let now = now_millis();
        let insert = MemberInsert {
            member_id: snowflake_id(),
            first_name: data.first_name.trim().to_string(),
            last_name: data.last_name.trim().to_string(),
            email: data.email,
            phone: data.phone,
            notes: data.notes,
            plan: data.plan,
            plan_start: data.plan_start,
            plan_end: plan::compute_end_date(data.plan_start, data.plan),
            payment_method: data.payment_method,
            card_uid,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut result = self
            .base
            .db()
            .query("CREATE member CONTENT $data")
            .bind(("data", insert))
            .await?;
        let created: Vec<MemberRecord> = result.take(0)?;
        created
            .into_iter()
            .next()
            .map(Member::from)
            .ok_or_else(|| RepoError::Database("Failed to create member".to_string()))
    }

    /// Partial update. If the plan or its start date changes, the end
    /// date is recomputed from the resulting pair.
    pub async fn update(&self, member_id: i64, data: MemberUpdate) -> RepoResult<Member> {
        validate_update(&data)?;

        let _guard = self.write_lock.lock().await;
        let record = self
            .find_record_by_id(member_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", member_id)))?;

        let new_card = match data.card_uid.as_deref() {
            Some(raw) => {
                let uid = normalize_card_uid(Some(raw)).ok_or_else(|| {
                    RepoError::Validation("card_uid must not be empty".to_string())
                })?;
                if record.card_uid.as_deref() != Some(uid.as_str()) {
                    self.ensure_card_unbound(&uid, Some(member_id)).await?;
                }
                Some(uid)
            }
            None => record.card_uid.clone(),
        };

        let plan = data.plan.unwrap_or(record.plan);
        let plan_start = data.plan_start.unwrap_or(record.plan_start);
        let plan_end = if data.plan.is_some() || data.plan_start.is_some() {
            plan::compute_end_date(plan_start, plan)
        } else {
            record.plan_end
        };

        let updated = MemberInsert {
            member_id: record.member_id,
            first_name: data
                .first_name
                .map(|v| v.trim().to_string())
                .unwrap_or(record.first_name),
            last_name: data
                .last_name
                .map(|v| v.trim().to_string())
                .unwrap_or(record.last_name),
            email: data.email.or(record.email),
            phone: data.phone.or(record.phone),
            notes: data.notes.or(record.notes),
            plan,
            plan_start,
            plan_end,
            payment_method: data.payment_method.unwrap_or(record.payment_method),
            card_uid: new_card,
            is_active: data.is_active.unwrap_or(record.is_active),
            created_at: record.created_at,
            updated_at: now_millis(),
        };

        let saved: Option<MemberRecord> = self
            .base
            .db()
            .update(record.id.clone())
            .content(updated)
            .await?;
        saved
            .map(Member::from)
            .ok_or_else(|| RepoError::Database(format!("Failed to update member {}", member_id)))
    }

    /// Bind a card to a member. Idempotent when the card is already
    /// bound to the same member; `Duplicate` naming the holder otherwise.
    pub async fn assign_card(&self, member_id: i64, card_uid: &str) -> RepoResult<Member> {
        let uid = normalize_card_uid(Some(card_uid))
            .ok_or_else(|| RepoError::Validation("card_uid must not be empty".to_string()))?;
        validate_required_text(&uid, "card_uid", MAX_SHORT_TEXT_LEN)?;

        let _guard = self.write_lock.lock().await;
        let record = self
            .find_record_by_id(member_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", member_id)))?;

        if record.card_uid.as_deref() == Some(uid.as_str()) {
            return Ok(record.into());
        }
        self.ensure_card_unbound(&uid, Some(member_id)).await?;

        self.set_card(record, Some(uid)).await
    }

    /// Unbind the member's card. Removing an absent card is a no-op.
    pub async fn remove_card(&self, member_id: i64) -> RepoResult<Member> {
        let _guard = self.write_lock.lock().await;
        let record = self
            .find_record_by_id(member_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", member_id)))?;

        if record.card_uid.is_none() {
            return Ok(record.into());
        }
        self.set_card(record, None).await
    }

    /// Hard administrative removal. Access-log rows are left behind.
    pub async fn delete(&self, member_id: i64) -> RepoResult<bool> {
        let _guard = self.write_lock.lock().await;
        let record = self
            .find_record_by_id(member_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", member_id)))?;

        let _: Option<MemberRecord> = self.base.db().delete(record.id).await?;
        Ok(true)
    }

    /// Flip `is_active` off for active members whose plan ended before
    /// today. Idempotent; returns how many rows changed.
    pub async fn deactivate_expired_plans(&self) -> RepoResult<u64> {
        let _guard = self.write_lock.lock().await;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE member SET is_active = false, updated_at = $now \
                 WHERE is_active = true AND plan_end < $today RETURN AFTER",
            )
            .bind(("now", now_millis()))
            .bind(("today", plan::today()))
            .await?;
        let changed: Vec<MemberRecord> = result.take(0)?;
        Ok(changed.len() as u64)
    }

    /// Total member count
    pub async fn count(&self) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM member GROUP ALL")
            .await?;
        let counts: Vec<CountResult> = result.take(0)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0))
    }

    // ── Internals ───────────────────────────────────────────────────

    async fn find_record_by_id(&self, member_id: i64) -> RepoResult<Option<MemberRecord>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM member WHERE member_id = $member_id LIMIT 1")
            .bind(("member_id", member_id))
            .await?;
        let records: Vec<MemberRecord> = result.take(0)?;
        Ok(records.into_iter().next())
    }

    /// Error with the holder's name when `card_uid` is bound to anyone
    /// other than `for_member`.
    async fn ensure_card_unbound(
        &self,
        card_uid: &str,
        for_member: Option<i64>,
    ) -> RepoResult<()> {
        if let Some(holder) = self.find_by_card_uid(card_uid).await?
            && Some(holder.id) != for_member
        {
            return Err(RepoError::Duplicate(format!(
                "Card {} is already assigned to {}",
                card_uid,
                holder.full_name()
            )));
        }
        Ok(())
    }

    async fn set_card(&self, record: MemberRecord, card_uid: Option<String>) -> RepoResult<Member> {
        let member_id = record.member_id;
        let record_id = record.id.clone();
        let mut insert = MemberInsert::from(&Member::from(record));
        insert.card_uid = card_uid;
        insert.updated_at = now_millis();

        let saved: Option<MemberRecord> = self.base.db().update(record_id).content(insert).await?;
        saved
            .map(Member::from)
            .ok_or_else(|| RepoError::Database(format!("Failed to update member {}", member_id)))
    }
}

fn normalize_card_uid(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_create(data: &MemberCreate) -> RepoResult<()> {
    validate_required_text(&data.first_name, "first_name", MAX_NAME_LEN)?;
    validate_required_text(&data.last_name, "last_name", MAX_NAME_LEN)?;
    validate_optional_text(&data.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&data.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;
    validate_optional_text(&data.card_uid, "card_uid", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

fn validate_update(data: &MemberUpdate) -> RepoResult<()> {
    if let Some(ref v) = data.first_name {
        validate_required_text(v, "first_name", MAX_NAME_LEN)?;
    }
    if let Some(ref v) = data.last_name {
        validate_required_text(v, "last_name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&data.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)?;
    validate_optional_text(&data.card_uid, "card_uid", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}
