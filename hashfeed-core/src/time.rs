use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

/// The search API's timestamp format, e.g. `Mon Sep 24 03:35:21 +0000 2012`.
const SOURCE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

pub fn parse_created_at(created_at: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(created_at, SOURCE_FORMAT).ok()
}

/// Coarse relative age for display: seconds under a minute, minutes under
/// an hour, hours beyond that. Unparseable input renders as empty, the
/// same way the feed leaves the field blank rather than failing a row.
pub fn display_age(created_at: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_created_at(created_at) else {
        warn!(created_at, "unparseable timestamp");
        return String::new();
    };

    let elapsed = (now - then.with_timezone(&Utc)).num_seconds().max(0);
    if elapsed < 60 {
        format!("{elapsed}s")
    } else if elapsed < 3600 {
        format!("{}m", elapsed / 60)
    } else {
        format!("{}h", elapsed / 3600)
    }
}

/// `display_age` against the wall clock.
pub fn display_age_now(created_at: &str) -> String {
    display_age(created_at, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_source_format() {
        let parsed = parse_created_at("Mon Sep 24 03:35:21 +0000 2012").unwrap();
        assert_eq!(parsed.timestamp(), 1348457721);
    }

    #[test]
    fn test_display_age_buckets() {
        let now = Utc.with_ymd_and_hms(2012, 9, 24, 4, 0, 0).unwrap();
        assert_eq!(display_age("Mon Sep 24 03:59:30 +0000 2012", now), "30s");
        assert_eq!(display_age("Mon Sep 24 03:35:21 +0000 2012", now), "24m");
        assert_eq!(display_age("Sun Sep 23 03:35:21 +0000 2012", now), "24h");
    }

    #[test]
    fn test_garbage_renders_empty() {
        assert_eq!(display_age("not a date", Utc::now()), "");
    }
}
