//! CSV tables: the fetched-email listing and generic header-checked I/O.

use crate::email::{decode_attachments, decode_time, encode_attachments, encode_time, EmailInfo};
use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

/// Header of the listing written by the `email` command.
pub const LISTING_HEADER: [&str; 6] = ["SeqNum", "Date", "From", "To", "Subject", "Attachments"];

/// A CSV file split into its header and data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl Table {
    /// Returns `true` if the header equals `expected`, ignoring surrounding whitespace.
    #[must_use]
    pub fn header_matches(&self, expected: &[&str]) -> bool {
        self.header.len() == expected.len()
            && self
                .header
                .iter()
                .zip(expected)
                .all(|(have, want)| have.trim() == *want)
    }
}

/// Reads a CSV file whose first row is a header.
///
/// Rows may have differing column counts; callers validate them.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if `path` is not a file, [`Error::Table`]
/// on malformed CSV, or [`Error::TableFormat`] if the file is empty.
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let table_err = |source| Error::Table {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(table_err)?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(table_err)?,
        None => {
            return Err(Error::TableFormat {
                path: path.to_path_buf(),
                message: "missing header row".to_string(),
            })
        }
    };
    let rows = records.collect::<std::result::Result<Vec<_>, _>>().map_err(table_err)?;

    debug!(path = %path.display(), rows = rows.len(), "Read table");
    Ok(Table {
        header: header.iter().map(String::from).collect(),
        rows,
    })
}

/// Writes `rows` under `header`, or appends them when `append` is set and
/// the file already exists.
///
/// Nothing is written when `rows` is empty. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`Error::TableFormat`] if a row does not have as many columns as
/// the header, or an I/O or CSV error.
pub fn write_table<I, R>(path: &Path, header: &[&str], rows: I, append: bool) -> Result<usize>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let rows: Vec<Vec<R::Item>> = rows.into_iter().map(|r| r.into_iter().collect()).collect();
    if rows.is_empty() {
        info!(path = %path.display(), "No data to handle");
        return Ok(0);
    }
    if let Some(row) = rows.iter().find(|r| r.len() != header.len()) {
        return Err(Error::TableFormat {
            path: path.to_path_buf(),
            message: format!(
                "row has {} columns but the header has {}",
                row.len(),
                header.len()
            ),
        });
    }

    let appending = append && path.is_file();
    let file = if appending {
        OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(Error::io("failed to open", path))?
    } else {
        std::fs::File::create(path).map_err(Error::io("failed to create", path))?
    };

    let table_err = |source| Error::Table {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if !appending {
        writer.write_record(header).map_err(table_err)?;
    }
    for row in &rows {
        writer.write_record(row).map_err(table_err)?;
    }
    writer
        .flush()
        .map_err(Error::io("failed to write", path))?;

    info!(path = %path.display(), rows = rows.len(), append = appending, "Wrote table");
    Ok(rows.len())
}

/// Writes (or appends) the email listing.
///
/// # Errors
///
/// Returns an I/O or CSV error.
pub fn write_listing(path: &Path, emails: &[EmailInfo], append: bool) -> Result<usize> {
    let rows = emails.iter().map(|e| {
        [
            e.seq_num.to_string(),
            encode_time(&e.date),
            e.from.clone(),
            e.to.join(","),
            e.subject.clone(),
            encode_attachments(&e.attachments),
        ]
    });
    write_table(path, &LISTING_HEADER, rows, append)
}

/// Reads an email listing written by [`write_listing`].
///
/// Rows with fewer than six columns are skipped.
///
/// # Errors
///
/// Returns [`Error::TableFormat`] if the header differs from
/// [`LISTING_HEADER`] or a sequence number is not a number, and
/// [`Error::InvalidDate`] for a bad date cell.
pub fn read_listing(path: &Path) -> Result<Vec<EmailInfo>> {
    let table = read_table(path)?;
    if !table.header_matches(&LISTING_HEADER) {
        return Err(Error::TableFormat {
            path: path.to_path_buf(),
            message: format!("header should be {}", LISTING_HEADER.join(", ")),
        });
    }

    let mut emails = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        if row.len() < LISTING_HEADER.len() {
            continue;
        }
        let seq_num = row[0].trim().parse().map_err(|_| Error::TableFormat {
            path: path.to_path_buf(),
            message: format!("invalid sequence number '{}'", &row[0]),
        })?;
        emails.push(EmailInfo {
            seq_num,
            date: decode_time(&row[1])?,
            from: row[2].to_string(),
            to: row[3]
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            subject: row[4].to_string(),
            attachments: decode_attachments(&row[5]),
        });
    }
    Ok(emails)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::tests::{at, email};
    use tempfile::TempDir;

    #[test]
    fn test_listing_write_and_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email.csv");

        let mut first = email(1, at(9, 0), "s1@example.com", "张三-2021001-实验一");
        first.attachments.push("附录.zip".into());
        assert_eq!(write_listing(&path, &[first.clone()], false).unwrap(), 1);

        let second = email(2, at(10, 0), "s2@example.com", "李四-2021002-实验一");
        assert_eq!(write_listing(&path, &[second.clone()], true).unwrap(), 1);

        let emails = read_listing(&path).unwrap();
        assert_eq!(emails, vec![first, second]);
    }

    #[test]
    fn test_write_without_append_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email.csv");

        write_listing(&path, &[email(1, at(9, 0), "a@x.cn", "a")], false).unwrap();
        write_listing(&path, &[email(2, at(9, 5), "b@x.cn", "b")], false).unwrap();

        let emails = read_listing(&path).unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].seq_num, 2);
    }

    #[test]
    fn test_empty_rows_write_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email.csv");

        assert_eq!(write_listing(&path, &[], false).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_read_listing_rejects_wrong_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email.csv");
        std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();

        assert!(matches!(read_listing(&path), Err(Error::TableFormat { .. })));
    }

    #[test]
    fn test_read_listing_skips_short_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email.csv");
        std::fs::write(
            &path,
            "SeqNum,Date,From,To,Subject,Attachments\n\
             7,2023-10-09T09:00:00+08:00,a@x.cn\n\
             8,2023-10-09T09:00:00+08:00,a@x.cn,\"t1@x.cn,t2@x.cn\",hi,\"a.doc\nb.zip\"\n",
        )
        .unwrap();

        let emails = read_listing(&path).unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].seq_num, 8);
        assert_eq!(emails[0].to, vec!["t1@x.cn", "t2@x.cn"]);
        assert_eq!(emails[0].attachments, vec!["a.doc", "b.zip"]);
    }

    #[test]
    fn test_read_missing_table() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_table(&dir.path().join("nope.csv")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_write_table_column_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        let err = write_table(&path, &["a", "b"], vec![vec!["1"]], false).unwrap_err();
        assert!(matches!(err, Error::TableFormat { .. }));
    }
}
