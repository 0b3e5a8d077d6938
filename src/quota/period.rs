// ABOUTME: Counting-period helpers for monthly quota windows
// ABOUTME: Computes the UTC instant at which monthly usage counters reset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Start of the calendar month after `now` (UTC midnight on the 1st)
#[must_use]
pub fn next_monthly_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| {
            tracing::warn!("Failed to build next month boundary, using fallback");
            now + chrono::Duration::days(31)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_month_rolls_to_first_of_next_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 17, 14, 5, 9).unwrap();
        let reset = next_monthly_reset(now);
        assert_eq!(reset, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let reset = next_monthly_reset(now);
        assert_eq!(reset, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
