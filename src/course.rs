//! Attributing fetched emails to courses, labs and students.

use crate::email::{encode_attachments, EmailInfo};
use crate::error::Result;
use crate::identify::{identify, LabCatalog};
use crate::roster::{read_name_list, CourseStudent};
use crate::settings::CourseSettings;
use crate::table::write_table;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Header of the submission result table.
pub const RESULT_HEADER: [&str; 9] = [
    "姓名",
    "学号",
    "课程",
    "实验名",
    "提交时间",
    "提交人邮件地址",
    "邮件主题",
    "附件名",
    "备注",
];

/// A course with its labs and the students of all its classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub name: String,
    pub labs: Vec<String>,
    pub students: Vec<CourseStudent>,
}

impl Course {
    /// Loads a course, reading every class name list it references.
    ///
    /// # Errors
    ///
    /// Returns an error if a name list is missing or malformed.
    pub fn load(settings: &CourseSettings) -> Result<Self> {
        let mut students = Vec::new();
        for class in &settings.classes {
            students.extend(read_name_list(class)?);
        }
        info!(course = %settings.name, labs = settings.labs.len(), students = students.len(), "Loaded course");
        Ok(Self {
            name: settings.name.clone(),
            labs: settings.labs.clone(),
            students,
        })
    }

    /// Checks a student against this course's roster.
    #[must_use]
    pub fn check(&self, name: &str, student_id: &str) -> SubmissionStatus {
        if name.is_empty() || student_id.is_empty() {
            return SubmissionStatus::Incomplete;
        }
        match self.students.iter().find(|s| s.id == student_id) {
            Some(s) if s.name == name => SubmissionStatus::Success,
            Some(s) => SubmissionStatus::NameMismatch {
                roster_name: s.name.clone(),
            },
            None => SubmissionStatus::NotInRoster,
        }
    }
}

/// Loads every configured course.
///
/// # Errors
///
/// Returns the first name-list error.
pub fn load_courses(settings: &[CourseSettings]) -> Result<Vec<Course>> {
    settings.iter().map(Course::load).collect()
}

/// Builds the lab catalog of all courses, in configured order.
#[must_use]
pub fn lab_catalog(courses: &[Course]) -> LabCatalog {
    let mut catalog = LabCatalog::new();
    for course in courses {
        for lab in &course.labs {
            catalog.insert(lab.clone(), course.name.clone());
        }
    }
    catalog
}

/// How a submission checks out against the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Success,
    /// The id is on the roster under another name.
    NameMismatch { roster_name: String },
    NotInRoster,
    /// Name or student id could not be read from the email.
    Incomplete,
    /// The email could not be attributed at all.
    Failed { reason: String },
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::NameMismatch { roster_name } => {
                write!(f, "Name mismatch, roster has {roster_name}")
            }
            Self::NotInRoster => f.write_str("Not in roster"),
            Self::Incomplete => f.write_str("Incomplete"),
            Self::Failed { reason } => write!(f, "Failed: {reason}"),
        }
    }
}

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub name: String,
    pub student_id: String,
    pub course: String,
    pub lab: String,
    pub time: String,
    pub email: String,
    pub subject: String,
    pub attachments: String,
    pub status: SubmissionStatus,
}

impl SubmissionRecord {
    fn row(&self) -> [String; 9] {
        [
            self.name.clone(),
            self.student_id.clone(),
            self.course.clone(),
            self.lab.clone(),
            self.time.clone(),
            self.email.clone(),
            self.subject.clone(),
            self.attachments.clone(),
            self.status.to_string(),
        ]
    }
}

/// Builds one record per identified lab of every email.
///
/// An email that cannot be identified yields a single `Failed` record.
#[must_use]
pub fn build_records(
    emails: &[EmailInfo],
    catalog: &LabCatalog,
    courses: &[Course],
) -> Vec<SubmissionRecord> {
    let mut records = Vec::new();

    for email in emails {
        let base = SubmissionRecord {
            name: String::new(),
            student_id: String::new(),
            course: String::new(),
            lab: String::new(),
            time: email.display_time(),
            email: email.from.clone(),
            subject: email.subject.clone(),
            attachments: encode_attachments(&email.attachments),
            status: SubmissionStatus::Success,
        };

        let found = match identify(&email.subject, &email.attachments, catalog) {
            Ok(found) => found,
            Err(e) => {
                warn!(seq = email.seq_num, subject = %email.subject, error = %e, "Failed to find student name and ID");
                records.push(SubmissionRecord {
                    status: SubmissionStatus::Failed {
                        reason: e.to_string(),
                    },
                    ..base
                });
                continue;
            }
        };

        let status = match courses.iter().find(|c| c.name == found.course) {
            Some(course) => course.check(&found.name, &found.student_id),
            None if found.name.is_empty() || found.student_id.is_empty() => {
                SubmissionStatus::Incomplete
            }
            None => SubmissionStatus::NotInRoster,
        };

        for lab in found.labs {
            records.push(SubmissionRecord {
                name: found.name.clone(),
                student_id: found.student_id.clone(),
                course: found.course.clone(),
                lab,
                status: status.clone(),
                ..base.clone()
            });
        }
    }

    records
}

/// Writes the result table, replacing any existing file.
///
/// # Errors
///
/// Returns an I/O or CSV error.
pub fn write_records(path: &Path, records: &[SubmissionRecord]) -> Result<usize> {
    write_table(path, &RESULT_HEADER, records.iter().map(SubmissionRecord::row), false)
}
