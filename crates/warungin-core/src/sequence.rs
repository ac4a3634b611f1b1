//! # Identifiers
//!
//! Business days and invoice numbers.
//!
//! ```text
//!   created_at (UTC) ──► + business offset ──► date ──► "2026-10-19"   (business_day)
//!                                                  └──► "INV-20261019-000042"
//!                                                                   ▲
//!                                             per-day global counter ┘
//! ```
//!
//! The counters themselves live in the database (`order_sequences`,
//! `invoice_sequences`) and are advanced atomically; this module only
//! formats.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Western Indonesia Time, UTC+7.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

/// Calendar date of `at` in the business's local offset.
pub fn business_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// Storage key of a business day, `yyyy-mm-dd`.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// `INV-{yyyymmdd}-{seq:06}`.
pub fn format_invoice_number(day: NaiveDate, seq: i64) -> String {
    format!("INV-{}-{:06}", day.format("%Y%m%d"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap()
    }

    #[test]
    fn test_business_day_rolls_at_local_midnight() {
        // 16:59 UTC is 23:59 WIB, 17:00 UTC is the next day
        let before = Utc.with_ymd_and_hms(2026, 10, 18, 16, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 10, 18, 17, 0, 0).unwrap();
        assert_eq!(day_key(business_day(before, wib())), "2026-10-18");
        assert_eq!(day_key(business_day(after, wib())), "2026-10-19");
    }

    #[test]
    fn test_invoice_format() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(format_invoice_number(day, 42), "INV-20261019-000042");
        assert_eq!(format_invoice_number(day, 1_234_567), "INV-20261019-1234567");
    }
}
