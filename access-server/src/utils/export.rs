//! CSV export helpers
//!
//! Builds CSV text in memory; handlers return it with a `text/csv`
//! content type. Column lists are fixed.

use serde::Serialize;
use shared::models::{AccessLogEntry, Member};

use super::time::format_millis;

pub const MEMBER_CSV_HEADER: &str = "id,first_name,last_name,email,phone,plan,plan_start,plan_end,payment_method,card_uid,is_active,notes";

pub const ACCESS_LOG_CSV_HEADER: &str = "id,timestamp,card_uid,member_id,outcome,reason";

/// Escape one CSV field (RFC 4180 quoting)
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Stable snake_case string for a serde-tagged enum value
fn enum_str<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn members_to_csv(members: &[Member]) -> String {
    let mut out = String::from(MEMBER_CSV_HEADER);
    out.push('\n');
    for m in members {
        out.push_str(&csv_line(&[
            m.id.to_string(),
            m.first_name.clone(),
            m.last_name.clone(),
            m.email.clone().unwrap_or_default(),
            m.phone.clone().unwrap_or_default(),
            m.plan.label().to_string(),
            m.plan_start.to_string(),
            m.plan_end.to_string(),
            m.payment_method.label().to_string(),
            m.card_uid.clone().unwrap_or_default(),
            m.is_active.to_string(),
            m.notes.clone().unwrap_or_default(),
        ]));
        out.push('\n');
    }
    out
}

pub fn access_logs_to_csv(entries: &[AccessLogEntry]) -> String {
    let mut out = String::from(ACCESS_LOG_CSV_HEADER);
    out.push('\n');
    for e in entries {
        out.push_str(&csv_line(&[
            e.id.to_string(),
            format_millis(e.timestamp),
            e.card_uid.clone(),
            e.member_id.map(|id| id.to_string()).unwrap_or_default(),
            enum_str(&e.outcome),
            enum_str(&e.reason),
        ]));
        out.push('\n');
    }
    out
}
