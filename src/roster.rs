//! Class rosters and the student dataset.

use crate::error::{Error, Result};
use crate::table::read_table;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// One entry of a course name list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseStudent {
    pub name: String,
    pub id: String,
}

/// Reads a course name list: a header row, then `name, id, ...` rows.
///
/// Rows with fewer than two columns are skipped.
///
/// # Errors
///
/// Returns an error if the file is missing or is not valid CSV.
pub fn read_name_list(path: &Path) -> Result<Vec<CourseStudent>> {
    let table = read_table(path)?;
    let students: Vec<CourseStudent> = table
        .rows
        .iter()
        .filter(|row| row.len() >= 2)
        .map(|row| CourseStudent {
            name: row[0].trim().to_string(),
            id: row[1].trim().to_string(),
        })
        .collect();

    debug!(path = %path.display(), students = students.len(), "Read name list");
    Ok(students)
}

/// One row of the all-student dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: String,
    pub no: String,
    pub class: String,
    pub grade: String,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, NO.: {}, Class: {}, Grade: {}",
            self.name, self.no, self.class, self.grade
        )
    }
}

const STUDENT_COLUMNS: usize = 4;

/// Reads the student dataset: `Name, No, Class, Grade`.
///
/// # Errors
///
/// Returns [`Error::TableFormat`] if the header or any row does not have
/// exactly four columns.
pub fn read_students(path: &Path) -> Result<Vec<Student>> {
    let table = read_table(path)?;
    if table.header.len() != STUDENT_COLUMNS {
        return Err(Error::TableFormat {
            path: path.to_path_buf(),
            message: format!("expected {STUDENT_COLUMNS} header columns, found {}", table.header.len()),
        });
    }

    table
        .rows
        .iter()
        .map(|row| {
            if row.len() != STUDENT_COLUMNS {
                return Err(Error::TableFormat {
                    path: path.to_path_buf(),
                    message: format!(
                        "expected {STUDENT_COLUMNS} columns in {:?}",
                        row.iter().collect::<Vec<_>>()
                    ),
                });
            }
            Ok(Student {
                name: row[0].to_string(),
                no: row[1].to_string(),
                class: row[2].to_string(),
                grade: row[3].to_string(),
            })
        })
        .collect()
}

/// Finds the first student whose number or name equals `key`.
#[must_use]
pub fn find_student<'a>(students: &'a [Student], key: &str) -> Option<&'a Student> {
    students.iter().find(|s| s.no == key || s.name == key)
}
