use std::time::Duration;

/// Human-readable elapsed time for summary logs
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

/// Lenient integer coercion for scraped fields: unparsable or negative
/// values become 0, never an error.
pub fn parse_count(raw: &str) -> i64 {
    raw.trim().parse::<i64>().ok().filter(|v| *v >= 0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_format_elapsed_minutes() {
        assert_eq!(format_elapsed(Duration::from_secs(95)), "1m 35s");
    }

    #[test]
    fn test_format_elapsed_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(3700)), "1h 1m 40s");
    }

    #[test]
    fn test_parse_count_valid() {
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count(" 6 "), 6);
    }

    #[test]
    fn test_parse_count_unparsable_is_zero() {
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("12a"), 0);
    }

    #[test]
    fn test_parse_count_negative_is_zero() {
        assert_eq!(parse_count("-3"), 0);
    }
}
