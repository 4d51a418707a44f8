//! Turning raw RFC 5322 messages into [`EmailInfo`] records.

use crate::email::{is_report_attachment, EmailInfo};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use mailparse::{addrparse_header, parse_mail, DispositionType, MailAddr, MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

/// Result of parsing one fetched message.
#[derive(Debug)]
pub(crate) enum ParseOutcome {
    /// The message was parsed.
    Parsed(EmailInfo),
    /// The message could not be used (logged, processing can continue).
    Skipped,
}

/// Parses an IMAP fetch result, logging and skipping unusable messages.
pub(crate) fn email_from_fetch(message: &async_imap::types::Fetch) -> ParseOutcome {
    let seq = message.message;

    let Some(body) = message.body() else {
        debug!(seq, "Message has no body");
        return ParseOutcome::Skipped;
    };

    match parse_email(seq, body) {
        Ok(Some(info)) => ParseOutcome::Parsed(info),
        Ok(None) => {
            warn!(seq, "Message has no usable Date header, skipping message");
            ParseOutcome::Skipped
        }
        Err(e) => {
            warn!(seq, error = %e, "Failed to parse email, skipping message");
            ParseOutcome::Skipped
        }
    }
}

/// Parses a raw message.
///
/// Returns `Ok(None)` when the message has no parsable `Date` header.
///
/// # Errors
///
/// Returns [`Error::ParseEmail`] if the message structure is malformed.
pub fn parse_email(seq_num: u32, raw: &[u8]) -> Result<Option<EmailInfo>> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseEmail { source })?;
    let headers = parsed.get_headers();

    let Some(date) = headers.get_first_value("Date").as_deref().and_then(parse_date) else {
        return Ok(None);
    };

    let from = addresses(&parsed, "From").into_iter().next().unwrap_or_default();
    let to = addresses(&parsed, "To");
    let subject = headers.get_first_value("Subject").unwrap_or_default();

    let mut attachments = Vec::new();
    collect_attachments(&parsed, &mut attachments);

    debug!(seq_num, %from, %subject, attachments = attachments.len(), "Parsed message");

    Ok(Some(EmailInfo {
        seq_num,
        date,
        from,
        to,
        subject,
        attachments,
    }))
}

fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value.trim()) {
        return Some(date);
    }
    // mailparse is more lenient with the odd formats some clients send
    let timestamp = mailparse::dateparse(value).ok()?;
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|d| d.fixed_offset())
}

/// Addresses in `name`, empty when the header is missing or malformed.
fn addresses(parsed: &ParsedMail<'_>, name: &str) -> Vec<String> {
    let headers = parsed.get_headers();
    let Some(header) = headers.get_first_header(name) else {
        return Vec::new();
    };
    let list = match addrparse_header(header) {
        Ok(list) => list,
        Err(error) => {
            warn!(header = name, value = %header.get_value(), %error, "Ignore malformed address header");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for addr in list.iter() {
        match addr {
            MailAddr::Single(single) => out.push(single.addr.clone()),
            MailAddr::Group(group) => out.extend(group.addrs.iter().map(|s| s.addr.clone())),
        }
    }
    out
}

fn collect_attachments(part: &ParsedMail<'_>, out: &mut Vec<String>) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_attachments(sub, out);
        }
        return;
    }

    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(|raw| decode_encoded_words(raw));

    let Some(filename) = filename else {
        return;
    };
    if disposition.disposition == DispositionType::Inline && part.ctype.mimetype.starts_with("text/") {
        return;
    }

    if is_report_attachment(&filename) {
        out.push(filename);
    } else {
        debug!(%filename, "Ignore attachment");
    }
}

/// Decodes RFC 2047 encoded words that some clients put in filename parameters.
fn decode_encoded_words(raw: &str) -> String {
    if !raw.contains("=?") {
        return raw.to_string();
    }
    let line = format!("X-Filename: {raw}");
    match mailparse::parse_header(line.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => raw.to_string(),
    }
}
