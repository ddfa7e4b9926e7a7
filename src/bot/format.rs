// Reply formatting helpers shared by the command modules

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::moderation::ArchivedOffense;

/// Discord's limit on an embed description
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;
/// Discord's limit on an embed field value
pub const EMBED_FIELD_LIMIT: usize = 1024;
/// Preview size for `scan_history`
pub const SCAN_PREVIEW_CHARS: usize = 1900;

/// Cut `text` to at most `max` characters, marking the cut
pub fn truncate_chars(text: &str, max: usize, marker: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(marker.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(marker);
    out
}

/// "category: count" per line
pub fn offense_lines(counts: &BTreeMap<String, u64>) -> String {
    counts
        .iter()
        .map(|(category, count)| format!("{}: {}", category, count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body of the `offenses_user` embed: counters, then the most recent
/// flagged messages.
pub fn user_offense_report(counts: &BTreeMap<String, u64>, recent: &[ArchivedOffense]) -> String {
    let mut report = offense_lines(counts);
    if !recent.is_empty() {
        report.push_str("\n\n**Recent flagged messages**");
        for offense in recent {
            report.push_str(&format!(
                "\n`{}` *{}*: {}",
                offense.timestamp.format("%Y-%m-%d %H:%M"),
                offense.category,
                offense.content
            ));
        }
    }
    truncate_chars(&report, EMBED_DESCRIPTION_LIMIT, "\n...")
}

/// 1-based numbered list, matching the indexes `removenote` accepts
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scanned message texts joined with blank lines, cut to the preview size
pub fn scan_preview(texts: &[String]) -> String {
    let joined = texts.join("\n\n");
    if joined.chars().count() > SCAN_PREVIEW_CHARS {
        let head: String = joined.chars().take(SCAN_PREVIEW_CHARS).collect();
        format!("{}\n...[truncated]", head)
    } else {
        joined
    }
}

/// "March 04, 2021\n(1234 days ago)"
pub fn date_with_age(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format!(
        "{}\n({} days ago)",
        when.format("%B %d, %Y"),
        (now - when).num_days().max(0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10, "..."), "short");
        assert_eq!(truncate_chars("abcdefghij", 6, "..."), "abc...");
        assert_eq!(truncate_chars("ééééé", 4, "…"), "ééé…");
    }

    #[test]
    fn test_user_offense_report_has_counts_and_messages() {
        let mut counts = BTreeMap::new();
        counts.insert("harassment".to_string(), 2);
        counts.insert("spam".to_string(), 1);
        let recent = vec![ArchivedOffense {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            category: "harassment".into(),
            content: "I hate X".into(),
        }];

        let report = user_offense_report(&counts, &recent);
        assert!(report.starts_with("harassment: 2\nspam: 1"));
        assert!(report.contains("`2024-05-01 09:30` *harassment*: I hate X"));
    }

    #[test]
    fn test_report_without_archive_is_counts_only() {
        let mut counts = BTreeMap::new();
        counts.insert("violence".to_string(), 3);
        assert_eq!(user_offense_report(&counts, &[]), "violence: 3");
    }

    #[test]
    fn test_numbered_list_is_one_based() {
        let notes = vec!["a".to_string(), "b".to_string()];
        assert_eq!(numbered_list(&notes), "1. a\n2. b");
    }

    #[test]
    fn test_scan_preview_truncates() {
        let long = vec!["x".repeat(1000), "y".repeat(1000)];
        let preview = scan_preview(&long);
        assert!(preview.ends_with("\n...[truncated]"));
        assert_eq!(preview.chars().count(), SCAN_PREVIEW_CHARS + "\n...[truncated]".len());

        assert_eq!(scan_preview(&["a".into(), "b".into()]), "a\n\nb");
    }

    #[test]
    fn test_date_with_age() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap();
        assert_eq!(date_with_age(created, now), "January 01, 2024\n(10 days ago)");
    }
}
