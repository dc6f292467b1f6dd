//! `MailFolder` / `MailFile` naming and `ProcessedMessageMetadata` (§3, §8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_SENDER_LEN: usize = 30;
const MAX_SUBJECT_LEN: usize = 50;
const MAX_FULL_NAME_LEN: usize = 100;

/// Strips characters invalid in filenames across common filesystems
/// (`<>:"/\|?*` plus ASCII control characters), collapses whitespace runs,
/// and trims. An all-invalid input sanitizes to the literal `"untitled"`
/// per §8's boundary behavior.
pub fn sanitize_filename_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !"<>:\"/\\|?*".contains(*c) && !c.is_control())
        .collect();
    let collapsed = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();
    if collapsed.is_empty() {
        "untitled".to_string()
    } else {
        collapsed
    }
}

fn truncate_chars(input: &str, max_len: usize) -> String {
    input.chars().take(max_len).collect()
}

/// A directory path (local backend) or path segment list (OneDrive backend)
/// derived from `{YYYYMMDD}_{sender-name}_{subject}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailFolder {
    pub name: String,
}

impl MailFolder {
    /// Builds the canonical folder name for a message.
    ///
    /// `subject` being empty (after sanitization) yields `no_subject`
    /// rather than `"untitled"`, per §8's boundary behavior — this
    /// special-cases the subject component distinctly from the generic
    /// all-invalid-characters case.
    pub fn derive(received_at: DateTime<Utc>, sender_name: &str, subject: &str) -> Self {
        let date = received_at.format("%Y%m%d").to_string();
        let sender = truncate_chars(&sanitize_filename_component(sender_name), MAX_SENDER_LEN);
        let subject_trimmed = subject.trim();
        let subject_component = if subject_trimmed.is_empty() {
            "no_subject".to_string()
        } else {
            truncate_chars(&sanitize_filename_component(subject_trimmed), MAX_SUBJECT_LEN)
        };
        Self {
            name: format!("{date}_{sender}_{subject_component}"),
        }
    }
}

/// A single saved file (attachment or body text) inside a [`MailFolder`],
/// with collision-safe naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailFile {
    pub filename: String,
}

impl MailFile {
    /// Sanitizes and bounds a raw attachment filename to `MAX_FULL_NAME_LEN`
    /// characters, preserving the extension where possible.
    pub fn sanitize(raw_filename: &str) -> Self {
        let sanitized = sanitize_filename_component(raw_filename);
        let (stem, ext) = split_extension(&sanitized);
        let budget = MAX_FULL_NAME_LEN.saturating_sub(ext.len() + 1);
        let stem = truncate_chars(stem, budget.max(1));
        let filename = if ext.is_empty() {
            stem
        } else {
            format!("{stem}.{ext}")
        };
        Self { filename }
    }

    /// Returns a collision-avoiding name by inserting `_{n}` before the
    /// extension, for the `n`-th duplicate (`n >= 1`) within a folder.
    pub fn with_dedup_suffix(&self, n: u32) -> Self {
        let (stem, ext) = split_extension(&self.filename);
        let filename = if ext.is_empty() {
            format!("{stem}_{n}")
        } else {
            format!("{stem}_{n}.{ext}")
        };
        Self { filename }
    }
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 && idx < filename.len() - 1 => {
            (&filename[..idx], &filename[idx + 1..])
        }
        _ => (filename, ""),
    }
}

/// A ledger entry recording a processed message, keyed by Graph message id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMessageRecord {
    pub message_id: String,
    pub subject: String,
    pub sender: String,
    pub received_date_time: DateTime<Utc>,
    pub folder_path: String,
    pub saved_file_paths: Vec<String>,
    pub processed_at: DateTime<Utc>,
    pub attachment_count: u32,
}

/// In-memory representation of the JSON-backed processed-message ledger
/// (§4.5.5). Persistence (file locking, lossy-reset-on-parse-failure) lives
/// in `outlook-attachments::metadata`; this type is the pure data shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedMessageMetadata {
    pub entries: std::collections::BTreeMap<String, ProcessedMessageRecord>,
}

impl ProcessedMessageMetadata {
    pub fn is_duplicate(&self, message_id: &str) -> bool {
        self.entries.contains_key(message_id)
    }

    pub fn add_processed(&mut self, record: ProcessedMessageRecord) {
        self.entries.insert(record.message_id.clone(), record);
    }

    pub fn filter_new<'a>(&self, ids: &'a [String]) -> Vec<&'a str> {
        ids.iter()
            .filter(|id| !self.is_duplicate(id))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn sanitize_all_invalid_chars_yields_untitled() {
        assert_eq!(sanitize_filename_component("***///"), "untitled");
    }

    #[test]
    fn derive_folder_name_empty_subject_yields_no_subject() {
        let folder = MailFolder::derive(date(), "Ada Lovelace", "   ");
        assert_eq!(folder.name, "20260305_Ada Lovelace_no_subject");
    }

    #[test]
    fn derive_folder_name_truncates_long_components() {
        let long_sender = "x".repeat(100);
        let long_subject = "y".repeat(100);
        let folder = MailFolder::derive(date(), &long_sender, &long_subject);
        let parts: Vec<&str> = folder.name.splitn(3, '_').collect();
        assert_eq!(parts[1].len(), MAX_SENDER_LEN);
        assert_eq!(parts[2].len(), MAX_SUBJECT_LEN);
    }

    #[test]
    fn mail_file_dedup_suffix_preserves_extension() {
        let file = MailFile::sanitize("report.pdf");
        let deduped = file.with_dedup_suffix(1);
        assert_eq!(deduped.filename, "report_1.pdf");
    }

    #[test]
    fn mail_file_sanitize_bounds_length() {
        let long_name = format!("{}.txt", "a".repeat(200));
        let file = MailFile::sanitize(&long_name);
        assert!(file.filename.len() <= MAX_FULL_NAME_LEN);
        assert!(file.filename.ends_with(".txt"));
    }

    #[test]
    fn metadata_filter_new_excludes_duplicates() {
        let mut meta = ProcessedMessageMetadata::default();
        meta.add_processed(ProcessedMessageRecord {
            message_id: "m1".into(),
            subject: "s".into(),
            sender: "a@example.com".into(),
            received_date_time: date(),
            folder_path: "20260305_a_s".into(),
            saved_file_paths: vec![],
            processed_at: date(),
            attachment_count: 0,
        });
        let ids = vec!["m1".to_string(), "m2".to_string()];
        assert_eq!(meta.filter_new(&ids), vec!["m2"]);
    }
}
