//! Membership plan policy
//!
//! Pure date arithmetic, no storage access. End dates are computed once
//! at write time and stored; a change in interpretation here never
//! retro-fixes stored values.

use chrono::{Months, NaiveDate};
use shared::models::PlanType;

/// Today's date in the gym's local time
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Plan end date: calendar-month addition with end-of-month clipping
/// (Jan 31 + 1 month lands on Feb 28/29, not Mar 2/3).
pub fn compute_end_date(start: NaiveDate, plan: PlanType) -> NaiveDate {
    start
        .checked_add_months(Months::new(plan.months()))
        .unwrap_or(start)
}

/// Plan still valid today (end date inclusive)
pub fn is_vigent(end: NaiveDate) -> bool {
    today() <= end
}

/// Signed whole days from today until `end` (negative once expired)
pub fn days_remaining(end: NaiveDate) -> i64 {
    (end - today()).num_days()
}

/// Human-readable plan status for member lists
pub fn plan_status_text(end: NaiveDate) -> String {
    let d = days_remaining(end);
    match d {
        d if d < -1 => format!("Expired {} days ago", -d),
        -1 => "Expired yesterday".to_string(),
        0 => "Expires today".to_string(),
        1 => "Expires tomorrow".to_string(),
        d if d <= 7 => format!("Expires in {} days", d),
        d => format!("Valid ({} days left)", d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_plan_adds_one_calendar_month() {
        assert_eq!(
            compute_end_date(date(2026, 3, 15), PlanType::Monthly),
            date(2026, 4, 15)
        );
    }

    #[test]
    fn month_end_clips_to_shorter_months() {
        // Leap year February
        assert_eq!(
            compute_end_date(date(2024, 1, 31), PlanType::Monthly),
            date(2024, 2, 29)
        );
        // Non-leap February
        assert_eq!(
            compute_end_date(date(2023, 1, 31), PlanType::Monthly),
            date(2023, 2, 28)
        );
        // Quarterly across a 30-day month boundary
        assert_eq!(
            compute_end_date(date(2026, 3, 31), PlanType::Quarterly),
            date(2026, 6, 30)
        );
        // Semiannual landing in February
        assert_eq!(
            compute_end_date(date(2025, 8, 31), PlanType::Semiannual),
            date(2026, 2, 28)
        );
    }

    #[test]
    fn plan_lengths_differ_only_in_months() {
        let start = date(2026, 1, 10);
        assert_eq!(
            compute_end_date(start, PlanType::Quarterly),
            date(2026, 4, 10)
        );
        assert_eq!(
            compute_end_date(start, PlanType::Semiannual),
            date(2026, 7, 10)
        );
    }

    #[test]
    fn vigency_is_inclusive_of_the_end_date() {
        let t = today();
        assert!(is_vigent(t));
        assert!(is_vigent(t + Duration::days(1)));
        assert!(!is_vigent(t - Duration::days(1)));
    }

    #[test]
    fn days_remaining_is_signed() {
        let t = today();
        assert_eq!(days_remaining(t), 0);
        assert_eq!(days_remaining(t + Duration::days(10)), 10);
        assert_eq!(days_remaining(t - Duration::days(3)), -3);
    }

    #[test]
    fn status_text_covers_every_band() {
        let t = today();
        assert_eq!(plan_status_text(t - Duration::days(5)), "Expired 5 days ago");
        assert_eq!(plan_status_text(t - Duration::days(1)), "Expired yesterday");
        assert_eq!(plan_status_text(t), "Expires today");
        assert_eq!(plan_status_text(t + Duration::days(1)), "Expires tomorrow");
        assert_eq!(plan_status_text(t + Duration::days(5)), "Expires in 5 days");
        assert_eq!(
            plan_status_text(t + Duration::days(30)),
            "Valid (30 days left)"
        );
    }
}
