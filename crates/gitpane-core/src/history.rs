use chrono::{DateTime, Utc};

use crate::models::Commit;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human-readable age of `then` as seen from `now`. Times in the future read
/// as "just now".
pub fn relative_time_from(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    match () {
        _ if seconds < 60 => "just now".to_string(),
        _ if minutes < 60 => plural(minutes, "min"),
        _ if hours < 24 => plural(hours, "hour"),
        _ if hours < 48 => "yesterday".to_string(),
        _ if days < 7 => plural(days, "day"),
        _ if days < 30 => plural(days / 7, "week"),
        _ if days < 365 => plural(days / 30, "month"),
        _ => plural(days / 365, "year"),
    }
}

pub fn relative_time(then: DateTime<Utc>) -> String {
    relative_time_from(then, Utc::now())
}

/// One-line summary used by history rows and the commit detail header.
pub fn commit_summary(commit: &Commit) -> String {
    let stats = &commit.stats;
    format!(
        "{} file{} changed, +{} -{}",
        stats.files_changed,
        if stats.files_changed == 1 { "" } else { "s" },
        stats.additions,
        stats.deletions
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{CommitFile, CommitStats, FileStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().expect("valid date")
    }

    fn ago(d: Duration) -> String {
        relative_time_from(now() - d, now())
    }

    #[test]
    fn buckets() {
        assert_eq!(ago(Duration::seconds(30)), "just now");
        assert_eq!(ago(Duration::seconds(60)), "1 min");
        assert_eq!(ago(Duration::minutes(5)), "5 mins");
        assert_eq!(ago(Duration::hours(1)), "1 hour");
        assert_eq!(ago(Duration::hours(23)), "23 hours");
        assert_eq!(ago(Duration::hours(25)), "yesterday");
        assert_eq!(ago(Duration::days(3)), "3 days");
        assert_eq!(ago(Duration::days(8)), "1 week");
        assert_eq!(ago(Duration::days(29)), "4 weeks");
        assert_eq!(ago(Duration::days(45)), "1 month");
        assert_eq!(ago(Duration::days(400)), "1 year");
        assert_eq!(ago(Duration::days(800)), "2 years");
    }

    #[test]
    fn future_reads_as_just_now() {
        assert_eq!(relative_time_from(now() + Duration::hours(2), now()), "just now");
    }

    fn bucket_rank(label: &str) -> (usize, i64) {
        const UNITS: [&str; 6] = ["min", "hour", "day", "week", "month", "year"];
        if label == "just now" {
            return (0, 0);
        }
        if label == "yesterday" {
            return (3, 0);
        }
        let (n, unit) = label.split_once(' ').expect("count and unit");
        let unit = unit.trim_end_matches('s');
        let idx = UNITS.iter().position(|u| *u == unit).expect("known unit");
        let rank = if idx >= 2 { idx + 2 } else { idx + 1 };
        (rank, n.parse().expect("numeric count"))
    }

    #[test]
    fn older_times_never_read_as_more_recent() {
        let steps: Vec<i64> = (0..2_000).map(|i| i * i * 37).collect();
        for pair in steps.windows(2) {
            let newer = ago(Duration::seconds(pair[0]));
            let older = ago(Duration::seconds(pair[1]));
            assert!(
                bucket_rank(&older) >= bucket_rank(&newer),
                "{older} should not be newer than {newer}"
            );
        }
    }

    #[test]
    fn summary_pluralizes_files() {
        let file = CommitFile {
            path: "a".to_string(),
            old_path: String::new(),
            status: FileStatus::Modified,
            additions: 2,
            deletions: 1,
            binary: false,
        };
        let commit = Commit {
            hash: "abc".to_string(),
            short_hash: "abc".to_string(),
            author: "A".to_string(),
            author_email: "a@example.com".to_string(),
            date: now(),
            subject: "s".to_string(),
            body: String::new(),
            parent_hashes: Vec::new(),
            is_merge: false,
            stats: CommitStats::from_files(std::slice::from_ref(&file)),
            files: vec![file],
        };
        assert_eq!(commit_summary(&commit), "1 file changed, +2 -1");
    }
}
