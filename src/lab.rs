//! Checking which students submitted a given lab, from report filenames.
//!
//! Reports are expected to be named `姓名-学号-实验名.doc[x]`. Files in the
//! directory tree are matched against a two-column name list, and the
//! result is one `Y`/`N` flag per student, in name-list order.

use crate::error::{Error, Result};
use crate::roster::CourseStudent;
use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;
use walkdir::WalkDir;

static REPORT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*\.(doc|docx)$").expect("valid regex"));

/// A name list with exactly `name,no` per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList {
    /// Fields of the first line.
    pub header: Vec<String>,
    pub students: Vec<CourseStudent>,
}

/// Reads a plain two-column name list.
///
/// The first line is the header. Lines with fewer than two fields (blank
/// lines included) are skipped.
///
/// # Errors
///
/// Returns [`Error::TableFormat`] if a line has more than two fields.
pub fn read_two_column_namelist(path: &Path) -> Result<NameList> {
    let content = std::fs::read_to_string(path).map_err(Error::io("failed to read", path))?;
    let mut lines = content.lines();

    let header = lines
        .next()
        .map(|line| line.split(',').map(|f| f.trim().to_string()).collect())
        .unwrap_or_default();

    let mut students = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 2 {
            continue;
        }
        if fields.len() != 2 {
            return Err(Error::TableFormat {
                path: path.to_path_buf(),
                message: format!("expected two columns but found {fields:?}"),
            });
        }
        students.push(CourseStudent {
            name: fields[0].trim().to_string(),
            id: fields[1].trim().to_string(),
        });
    }

    Ok(NameList { header, students })
}

/// Outcome of checking one lab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabReport {
    pub lab: String,
    /// One flag per name-list entry.
    pub submitted: Vec<bool>,
    /// Report files whose name does not follow the convention or names
    /// another lab.
    pub illegal: Vec<String>,
    /// Well-named reports from students missing in the name list.
    pub not_found: Vec<String>,
}

impl LabReport {
    /// Renders the flags: the lab name, then one `Y`/`N` per student.
    ///
    /// In debug mode the first line is the name-list header plus the lab
    /// and each row is `name,no,flag`.
    #[must_use]
    pub fn render(&self, names: &NameList, debug: bool) -> String {
        let mut out = String::new();
        if debug {
            let mut header = names.header.clone();
            header.push(self.lab.clone());
            let _ = writeln!(out, "{}", header.join(","));
        } else {
            let _ = writeln!(out, "{}", self.lab);
        }

        for (student, &flag) in names.students.iter().zip(&self.submitted) {
            let flag = if flag { "Y" } else { "N" };
            if debug {
                let _ = writeln!(out, "{},{},{flag}", student.name, student.id);
            } else {
                let _ = writeln!(out, "{flag}");
            }
        }
        out
    }

    /// Renders the illegal and not-found file lists, empty when there are none.
    #[must_use]
    pub fn render_problems(&self) -> String {
        let mut out = String::new();
        if !self.illegal.is_empty() {
            out.push_str("Illegal file name:\n");
            for name in &self.illegal {
                let _ = writeln!(out, "{name}");
            }
        }
        if !self.not_found.is_empty() {
            out.push_str("Not found:\n");
            for name in &self.not_found {
                let _ = writeln!(out, "{name}");
            }
        }
        out
    }
}

/// Walks `dir` and flags every student in `roster` with a report for `lab`.
///
/// Unreadable entries are logged and skipped.
#[must_use]
pub fn check_lab(dir: &Path, lab: &str, roster: &[CourseStudent]) -> LabReport {
    let mut report = LabReport {
        lab: lab.to_string(),
        submitted: vec![false; roster.len()],
        illegal: Vec::new(),
        not_found: Vec::new(),
    };

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !REPORT_FILE.is_match(&file_name) {
            continue;
        }

        let fields: Vec<&str> = file_name.split('-').collect();
        if fields.len() < 3 {
            report.illegal.push(file_name.into_owned());
            continue;
        }
        let (name, no) = (fields[0], fields[1]);
        let rest = fields[2..].join("-");
        let submitted_lab = rest.split('.').next().unwrap_or_default();
        if submitted_lab != lab {
            report.illegal.push(file_name.into_owned());
            continue;
        }

        match roster.iter().position(|s| s.name == name && s.id == no) {
            Some(idx) => report.submitted[idx] = true,
            None => report.not_found.push(file_name.into_owned()),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names() -> NameList {
        NameList {
            header: vec!["name".into(), "no".into()],
            students: vec![
                CourseStudent { name: "张三".into(), id: "2021001".into() },
                CourseStudent { name: "李四".into(), id: "2021002".into() },
                CourseStudent { name: "王五".into(), id: "2021003".into() },
            ],
        }
    }

    #[test]
    fn test_read_two_column_namelist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("namelist.csv");
        std::fs::write(&path, "name,no\r\n张三, 2021001\r\n\r\n李四,2021002\n").unwrap();

        let list = read_two_column_namelist(&path).unwrap();
        assert_eq!(list.header, vec!["name", "no"]);
        assert_eq!(list.students.len(), 2);
        assert_eq!(list.students[0].id, "2021001");
    }

    #[test]
    fn test_read_two_column_namelist_rejects_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("namelist.csv");
        std::fs::write(&path, "name,no\n张三,2021001,计科\n").unwrap();

        assert!(matches!(
            read_two_column_namelist(&path),
            Err(Error::TableFormat { .. })
        ));
    }

    #[test]
    fn test_check_lab() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("late");
        std::fs::create_dir(&nested).unwrap();
        for name in [
            "张三-2021001-实验一.docx",
            "赵六-2021009-实验一.doc",
            "李四-2021002-实验二.docx",
            "王五2021003实验一.docx",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::write(nested.join("王五-2021003-实验一.doc"), b"x").unwrap();

        let list = names();
        let report = check_lab(dir.path(), "实验一", &list.students);

        assert_eq!(report.submitted, vec![true, false, true]);
        assert_eq!(report.not_found, vec!["赵六-2021009-实验一.doc"]);
        assert_eq!(report.illegal.len(), 2);
        assert!(report.illegal.contains(&"李四-2021002-实验二.docx".to_string()));
        assert!(report.illegal.contains(&"王五2021003实验一.docx".to_string()));

        assert_eq!(report.render(&list, false), "实验一\nY\nN\nY\n");
        assert_eq!(
            report.render(&list, true),
            "name,no,实验一\n张三,2021001,Y\n李四,2021002,N\n王五,2021003,Y\n"
        );
        assert!(report.render_problems().starts_with("Illegal file name:\n"));
        assert!(report.render_problems().ends_with("Not found:\n赵六-2021009-实验一.doc\n"));
    }

    #[test]
    fn test_lab_name_with_dash() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("张三-2021001-Lab-3.docx"), b"x").unwrap();

        let report = check_lab(dir.path(), "Lab-3", &names().students);
        assert_eq!(report.submitted, vec![true, false, false]);
        assert!(report.render_problems().is_empty());
    }
}
