//! Meeting-day normalization and day-proximity arithmetic.
//!
//! Upstream data carried several redundant weekday encodings ("4",
//! "4.0", "Thursday", and 0-based Sunday in places). Everything in this
//! system uses a single domain: 1 = Monday .. 7 = Sunday, matching ISO
//! weekday numbering. The admin importer normalizes on the way in; at
//! runtime an out-of-domain value ranks as "7 days away" instead of
//! breaking the sort.

use chrono::Datelike;

/// Number of days treated as "never upcoming" for groups whose meeting
/// day is missing or unparseable.
pub const DAYS_UNTIL_UNKNOWN: u8 = 7;

/// Today's weekday in the 1=Monday..7=Sunday domain.
pub fn today_iso(date: chrono::NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

/// Non-negative days until the next occurrence of `meeting_day`,
/// evaluated on weekday `today` (both 1..=7).
///
/// A group meeting on day `W` evaluated on `W` itself yields 0; the day
/// after yields 6. `None` or out-of-domain days yield
/// [`DAYS_UNTIL_UNKNOWN`].
pub fn days_until(meeting_day: Option<u8>, today: u8) -> u8 {
    debug_assert!((1..=7).contains(&today));
    match meeting_day {
        Some(day) if (1..=7).contains(&day) => {
            (i16::from(day) - i16::from(today)).rem_euclid(7) as u8
        }
        _ => DAYS_UNTIL_UNKNOWN,
    }
}

/// Parse any of the observed upstream weekday encodings into the
/// normalized 1..=7 domain.
///
/// Accepts integer strings ("4"), float strings ("4.0"), full English
/// day names, and the legacy 0-based Sunday encoding (0 maps to 7).
pub fn normalize_meeting_day(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(n) = trimmed.parse::<f64>() {
        if n.fract() != 0.0 {
            return None;
        }
        return match n as i64 {
            0 => Some(7), // legacy 0 = Sunday
            d @ 1..=7 => Some(d as u8),
            _ => None,
        };
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "monday" => Some(1),
        "tuesday" => Some(2),
        "wednesday" => Some(3),
        "thursday" => Some(4),
        "friday" => Some(5),
        "saturday" => Some(6),
        "sunday" => Some(7),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn same_day_is_zero_days_away() {
        for day in 1..=7 {
            assert_eq!(days_until(Some(day), day), 0);
        }
    }

    #[test]
    fn day_after_meeting_is_six_days_away() {
        // Thursday group evaluated on Friday.
        assert_eq!(days_until(Some(4), 5), 6);
        // Sunday group evaluated on Monday.
        assert_eq!(days_until(Some(7), 1), 6);
    }

    #[test]
    fn wraps_across_the_week_boundary() {
        // Monday group evaluated on Sunday.
        assert_eq!(days_until(Some(1), 7), 1);
        // Wednesday group evaluated on Monday.
        assert_eq!(days_until(Some(3), 1), 2);
    }

    #[test]
    fn unknown_day_ranks_last() {
        assert_eq!(days_until(None, 3), DAYS_UNTIL_UNKNOWN);
        assert_eq!(days_until(Some(0), 3), DAYS_UNTIL_UNKNOWN);
        assert_eq!(days_until(Some(9), 3), DAYS_UNTIL_UNKNOWN);
    }

    #[test]
    fn normalizes_integer_and_float_strings() {
        assert_eq!(normalize_meeting_day("4"), Some(4));
        assert_eq!(normalize_meeting_day("4.0"), Some(4));
        assert_eq!(normalize_meeting_day(" 7 "), Some(7));
    }

    #[test]
    fn normalizes_day_names() {
        assert_eq!(normalize_meeting_day("Thursday"), Some(4));
        assert_eq!(normalize_meeting_day("monday"), Some(1));
        assert_eq!(normalize_meeting_day("SUNDAY"), Some(7));
    }

    #[test]
    fn legacy_zero_maps_to_sunday() {
        assert_eq!(normalize_meeting_day("0"), Some(7));
        assert_eq!(normalize_meeting_day("0.0"), Some(7));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_meeting_day(""), None);
        assert_eq!(normalize_meeting_day("someday"), None);
        assert_eq!(normalize_meeting_day("4.5"), None);
        assert_eq!(normalize_meeting_day("8"), None);
    }

    #[test]
    fn today_iso_matches_known_dates() {
        // 2024-01-04 was a Thursday.
        let thursday = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        assert_eq!(today_iso(thursday), 4);
        // 2024-01-07 was a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(today_iso(sunday), 7);
    }
}
