//! Access Authorization Engine
//!
//! Turns a presented card UID into an allow/deny verdict, records every
//! attempt in the access log and pulses the door actuator on success.
//!
//! The decision pipeline runs in a fixed order: unknown card, inactive
//! member, expired plan, ok. A member that is both inactive and expired
//! reports inactive. Denials are ordinary values; errors here mean the
//! store itself failed.

use std::sync::Arc;

use serde::Serialize;
use shared::models::{AccessOutcome, AccessReason, Member};

use crate::access::plan;
use crate::db::repository::{AccessLogRepository, MemberRepository, RepoResult};
use crate::reader::DoorActuator;

/// Characters of the note carried into the `MANUAL-<note>` sentinel UID
const MANUAL_NOTE_MAX: usize = 20;

/// Verdict of the decision pipeline
#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub outcome: AccessOutcome,
    pub reason: AccessReason,
    pub member: Option<Member>,
}

/// Result handed to the presentation layer and broadcast to watchers
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheckResult {
    pub card_uid: String,
    pub outcome: AccessOutcome,
    pub reason: AccessReason,
    pub member: Option<Member>,
    pub message: String,
    /// false when the attempt could not be recorded in the access log
    pub logged: bool,
}

pub struct AccessEngine {
    members: MemberRepository,
    access_logs: AccessLogRepository,
    actuator: Arc<dyn DoorActuator>,
    /// Serializes decisions across every entry path (reader worker and API)
    decision_lock: tokio::sync::Mutex<()>,
}

impl AccessEngine {
    pub fn new(
        members: MemberRepository,
        access_logs: AccessLogRepository,
        actuator: Arc<dyn DoorActuator>,
    ) -> Self {
        Self {
            members,
            access_logs,
            actuator,
            decision_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run the decision pipeline without side effects.
    pub async fn decide(&self, card_uid: &str) -> RepoResult<AccessDecision> {
        let card_uid = card_uid.trim();
        let decision = match self.members.find_by_card_uid(card_uid).await? {
            None => AccessDecision {
                outcome: AccessOutcome::Denied,
                reason: AccessReason::NotFound,
                member: None,
            },
            Some(m) if !m.is_active => AccessDecision {
                outcome: AccessOutcome::Denied,
                reason: AccessReason::Inactive,
                member: Some(m),
            },
            Some(m) if !plan::is_vigent(m.plan_end) => AccessDecision {
                outcome: AccessOutcome::Denied,
                reason: AccessReason::Expired,
                member: Some(m),
            },
            Some(m) => AccessDecision {
                outcome: AccessOutcome::Allowed,
                reason: AccessReason::Ok,
                member: Some(m),
            },
        };
        Ok(decision)
    }

    /// Full pipeline: decide, record the attempt, open the door on allow.
    ///
    /// The attempt is recorded whatever the verdict. If the append fails
    /// the decision still stands; the gap is logged loudly and the result
    /// carries `logged = false`.
    pub async fn process_access(&self, card_uid: &str) -> RepoResult<AccessCheckResult> {
        let _guard = self.decision_lock.lock().await;
        let card_uid = card_uid.trim();
        let decision = self.decide(card_uid).await?;

        let logged = match self
            .access_logs
            .append(
                card_uid,
                decision.outcome,
                decision.reason,
                decision.member.as_ref().map(|m| m.id),
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    card_uid = %card_uid,
                    error = %e,
                    "Access attempt could not be recorded"
                );
                false
            }
        };

        if decision.outcome == AccessOutcome::Allowed {
            self.open_door();
        }

        Ok(Self::result_for(card_uid.to_string(), decision, logged))
    }

    /// Decision preview: nothing is logged, the door stays closed.
    pub async fn check_access(&self, card_uid: &str) -> RepoResult<AccessCheckResult> {
        let decision = self.decide(card_uid).await?;
        Ok(Self::result_for(card_uid.trim().to_string(), decision, false))
    }

    /// Staff override: unconditional allow under a `MANUAL-<note>` sentinel.
    pub async fn register_manual_access(&self, note: &str) -> RepoResult<AccessCheckResult> {
        let _guard = self.decision_lock.lock().await;
        let trimmed: String = note.trim().chars().take(MANUAL_NOTE_MAX).collect();
        let sentinel = format!("MANUAL-{}", trimmed);

        let logged = match self
            .access_logs
            .append(&sentinel, AccessOutcome::Allowed, AccessReason::Manual, None)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    card_uid = %sentinel,
                    error = %e,
                    "Manual admission could not be recorded"
                );
                false
            }
        };

        self.open_door();

        let message = if trimmed.is_empty() {
            "Manual admission".to_string()
        } else {
            format!("Manual admission: {}", trimmed)
        };
        Ok(AccessCheckResult {
            card_uid: sentinel,
            outcome: AccessOutcome::Allowed,
            reason: AccessReason::Manual,
            member: None,
            message,
            logged,
        })
    }

    /// Pulse the door. The verdict never hinges on the actuator.
    fn open_door(&self) {
        if !self.actuator.open_door() {
            tracing::warn!("Door actuator rejected the open command");
        }
    }

    fn result_for(card_uid: String, decision: AccessDecision, logged: bool) -> AccessCheckResult {
        let message = match (decision.reason, &decision.member) {
            (AccessReason::Ok, Some(m)) => format!("Access granted: {}", m.full_name()),
            (AccessReason::Inactive, Some(m)) => {
                format!("Access denied: {} is inactive", m.full_name())
            }
            (AccessReason::Expired, Some(m)) => format!(
                "Access denied: plan for {} expired on {}",
                m.full_name(),
                m.plan_end
            ),
            (AccessReason::NotFound, _) => "Access denied: card not registered".to_string(),
            (AccessReason::Manual, _) => "Manual admission".to_string(),
            // Reasons tied to a member always carry one; kept for exhaustiveness
            (reason, None) => format!("Access decision: {:?}", reason),
        };
        AccessCheckResult {
            card_uid,
            outcome: decision.outcome,
            reason: decision.reason,
            member: decision.member,
            message,
            logged,
        }
    }
}
