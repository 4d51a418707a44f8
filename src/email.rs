//! Fetched email records and their de-duplication.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Attachment extensions kept in listings; everything else is ignored.
pub const REPORT_EXTENSIONS: &[&str] = &["doc", "docx", "zip", "rar"];

/// Basic information about one fetched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailInfo {
    /// Sequence number in the mailbox at fetch time.
    pub seq_num: u32,
    /// The `Date` header.
    pub date: DateTime<FixedOffset>,
    /// First sender address.
    pub from: String,
    /// All recipient addresses.
    pub to: Vec<String>,
    /// Decoded subject.
    pub subject: String,
    /// Report attachment filenames.
    pub attachments: Vec<String>,
}

impl EmailInfo {
    /// Returns `true` if both records describe the same message.
    ///
    /// Sequence numbers shift between fetches, so they are not compared.
    #[must_use]
    pub fn same_message(&self, other: &Self) -> bool {
        self.date == other.date
            && self.from == other.from
            && self.to == other.to
            && self.subject == other.subject
            && self.attachments == other.attachments
    }

    /// Submission time as shown in reports, in the sender's offset.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.date.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Returns `true` if the filename has one of [`REPORT_EXTENSIONS`].
#[must_use]
pub fn is_report_attachment(filename: &str) -> bool {
    filename.rsplit_once('.').is_some_and(|(_, ext)| {
        REPORT_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

/// Removes repeated messages, keeping first occurrences, then orders by date.
#[must_use]
pub fn dedup(emails: Vec<EmailInfo>) -> Vec<EmailInfo> {
    let mut kept: Vec<EmailInfo> = Vec::with_capacity(emails.len());
    for email in emails {
        if !kept.iter().any(|k| k.same_message(&email)) {
            kept.push(email);
        }
    }
    kept.sort_by_key(|e| e.date);
    kept
}

/// Joins attachment names into one table cell.
#[must_use]
pub fn encode_attachments(attachments: &[String]) -> String {
    attachments.join("\n")
}

/// Splits a table cell back into attachment names.
#[must_use]
pub fn decode_attachments(cell: &str) -> Vec<String> {
    cell.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Formats a date for the listing table.
#[must_use]
pub fn encode_time(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parses a date cell written by [`encode_time`].
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the cell is not RFC 3339.
pub fn decode_time(cell: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(cell.trim()).map_err(|source| Error::InvalidDate {
        value: cell.to_string(),
        source,
    })
}
