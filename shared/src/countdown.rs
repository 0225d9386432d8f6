use std::fmt::Write;

/// Text for a countdown element whose target is `target_secs`.
///
/// Returns `None` once the target has passed; the element then keeps whatever
/// it last showed.
pub fn countdown_text(target_secs: i64, now_secs: i64) -> Option<String> {
    let left = (target_secs - now_secs).max(0);
    if left == 0 {
        return None;
    }
    let mut out = String::with_capacity(8);
    write_hms(&mut out, left);
    Some(out)
}

/// Fixed-width HH:MM:SS with cumulative hours.
pub fn write_hms(buf: &mut String, total_secs: i64) {
    buf.clear();
    let secs = total_secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    let _ = write!(buf, "{hours:02}:{minutes:02}:{seconds:02}");
}

/// Epoch milliseconds to the nearest whole second.
pub fn secs_from_millis(millis: i64) -> i64 {
    (millis + 500).div_euclid(1000)
}

/// Parse a `data-time` attribute. Garbage yields `None` and the element is skipped.
pub fn parse_target(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_seconds_only() {
        assert_eq!(countdown_text(1_059, 1_000).as_deref(), Some("00:00:59"));
    }

    #[test]
    fn formats_hour_minute_second() {
        assert_eq!(countdown_text(3_661, 0).as_deref(), Some("01:01:01"));
    }

    #[test]
    fn formats_cumulative_hours() {
        assert_eq!(countdown_text(90_061, 0).as_deref(), Some("25:01:01"));
    }

    #[test]
    fn expired_countdown_leaves_text_alone() {
        assert_eq!(countdown_text(1_000, 1_000), None);
        assert_eq!(countdown_text(1_000, 5_000), None);
    }

    #[test]
    fn clock_rounds_to_nearest_second() {
        assert_eq!(secs_from_millis(1_000_499), 1_000);
        assert_eq!(secs_from_millis(1_000_500), 1_001);
        assert_eq!(secs_from_millis(999_999), 1_000);
    }

    #[test]
    fn parses_data_time_attribute() {
        assert_eq!(parse_target(" 1500000000 "), Some(1_500_000_000));
        assert_eq!(parse_target("soon"), None);
    }
}
