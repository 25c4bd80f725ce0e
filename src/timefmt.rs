//! "Last updated" display

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

const ABSOLUTE_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

/// `"June 15, 2024 at 12:00 PM (3 minutes ago)"`, rendered in the time
/// zone of `now`
pub fn format_update_time<Tz>(timestamp: i64, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let absolute = match now.timezone().timestamp_opt(timestamp, 0).single() {
        Some(at) => at.format(ABSOLUTE_FORMAT).to_string(),
        None => timestamp.to_string(),
    };
    let relative = relative_time(timestamp.saturating_sub(now.timestamp()));
    format!("{} ({})", absolute, relative)
}

/// Coarsest of seconds, minutes or hours for a signed offset from now
pub fn relative_time(delta_seconds: i64) -> String {
    let magnitude = delta_seconds.unsigned_abs();
    if magnitude < 60 {
        phrase(delta_seconds, "second")
    } else if magnitude < 3_600 {
        phrase(delta_seconds.div_euclid(60), "minute")
    } else {
        phrase(delta_seconds.div_euclid(3_600), "hour")
    }
}

fn phrase(amount: i64, unit: &str) -> String {
    if amount == 0 {
        return match unit {
            "second" => "now".to_string(),
            _ => format!("this {}", unit),
        };
    }
    let n = amount.unsigned_abs();
    let plural = if n == 1 { "" } else { "s" };
    if amount > 0 {
        format!("in {} {}{}", n, unit, plural)
    } else {
        format!("{} {}{} ago", n, unit, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_relative_seconds() {
        assert_eq!(relative_time(0), "now");
        assert_eq!(relative_time(-1), "1 second ago");
        assert_eq!(relative_time(-59), "59 seconds ago");
        assert_eq!(relative_time(30), "in 30 seconds");
    }

    #[test]
    fn test_relative_minutes_floor() {
        assert_eq!(relative_time(-60), "1 minute ago");
        // floor(-90 / 60) = -2
        assert_eq!(relative_time(-90), "2 minutes ago");
        assert_eq!(relative_time(90), "in 1 minute");
        assert_eq!(relative_time(-180), "3 minutes ago");
    }

    #[test]
    fn test_relative_hours() {
        assert_eq!(relative_time(7_200), "in 2 hours");
        assert_eq!(relative_time(-3_600), "1 hour ago");
        assert_eq!(relative_time(-90_000), "25 hours ago");
    }

    #[test]
    fn test_relative_extremes() {
        assert_eq!(relative_time(i64::MIN), format!("{} hours ago", (i64::MIN / -3_600) + 1));
        assert_eq!(relative_time(i64::MAX), format!("in {} hours", i64::MAX / 3_600));
    }

    #[test]
    fn test_format_update_time_far_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let text = format_update_time(i64::MIN, &now);
        assert!(text.starts_with(&i64::MIN.to_string()), "{}", text);
        assert!(text.ends_with("hours ago)"), "{}", text);
    }

    #[test]
    fn test_format_update_time_utc() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 3, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        assert_eq!(
            format_update_time(updated.timestamp(), &now),
            "June 15, 2024 at 12:00 PM (3 minutes ago)"
        );
    }

    #[test]
    fn test_format_uses_now_timezone() {
        let tz = FixedOffset::east_opt(2 * 3_600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 1, 2, 9, 5, 0).unwrap();
        let in_two_hours = now.timestamp() + 7_200;

        assert_eq!(
            format_update_time(in_two_hours, &now),
            "January 2, 2024 at 11:05 AM (in 2 hours)"
        );
    }
}
