//! Heuristics that recover `(name, student id, course, lab)` from the
//! free-form subjects and attachment names students send.
//!
//! Students rarely follow the requested `姓名-学号-实验名` convention, so
//! extraction is layered:
//!
//! 1. [`clean_name`] normalises separators (`_`, spaces, stray dots) to `-`
//!    and drops parenthesised remarks such as `(重交)`.
//! 2. [`extract_name_and_id`] splits on `-`, falling back to
//!    [`extract_name_and_id_by_digits`] for inputs like `220301033刘徐明`.
//! 3. [`LabCatalog::find_lab`] looks for a configured lab name, first as a
//!    substring, then by [`longest_common_substring`].
//! 4. [`identify`] combines the subject and every attachment of one email.

use crate::email::REPORT_EXTENSIONS;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest name, in bytes, accepted before retrying without the lab name.
const MAX_NAME_BYTES: usize = "四字姓名".len();

/// Shortest student id accepted.
const MIN_ID_LEN: usize = 6;

/// A fuzzy lab match must share more than this many bytes.
const MIN_COMMON_BYTES: usize = 4;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Why an email could not be attributed to a student and lab.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifyError {
    /// The subject is empty after cleaning.
    #[error("no subject found")]
    NoSubject,

    /// The email carries no report attachment.
    #[error("no attachments found")]
    NoAttachments,

    /// Neither the subject nor any attachment names a known lab.
    #[error("no lab name found in subject or attachments")]
    NoLab,

    /// The text does not contain a usable name and student id.
    #[error("illegal input: {input}, lack of name and id")]
    NameAndIdNotFound {
        /// The cleaned text.
        input: String,
    },

    /// The text does not contain a known lab name.
    #[error("邮件主题/附件名称中未找到实验名")]
    LabNotFound,
}

/// Normalises a subject or filename so its fields are separated by single `-`.
///
/// ```
/// use mytools::identify::clean_name;
///
/// assert_eq!(clean_name(" 张三_2021001  实验一(重交)。"), "张三-2021001-实验一");
/// assert_eq!(clean_name("张三.2021001.实验一.docx"), "张三-2021001-实验一.docx");
/// ```
#[must_use]
pub fn clean_name(input: &str) -> String {
    let mut s = input.replace('。', "");

    let dots = s.matches('.').count();
    if dots > 1 {
        s = s.replacen('.', "-", dots - 1);
    }

    let s = s.trim().replace('_', "-");

    let mut dashed = String::with_capacity(s.len());
    for c in s.chars() {
        if c == ' ' {
            if !dashed.ends_with('-') {
                dashed.push('-');
            }
        } else {
            dashed.push(c);
        }
    }

    let mut out = String::with_capacity(dashed.len());
    for c in dashed.trim_matches('-').chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    while let Some(next) =
        remove_first_group(&out, '(', ')').or_else(|| remove_first_group(&out, '（', '）'))
    {
        out = next;
    }
    out
}

/// Removes the first `open ... close` group, or returns `None` when no `close`
/// follows the first `open`.
fn remove_first_group(s: &str, open: char, close: char) -> Option<String> {
    let left = s.find(open)?;
    let right = left + s[left..].find(close)?;
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..left]);
    out.push_str(&s[right + close.len_utf8()..]);
    Some(out)
}

/// Removes a trailing report extension (`.doc`, `.docx`, `.zip`, `.rar`).
#[must_use]
pub fn strip_attachment_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if REPORT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => filename,
    }
}

/// Returns `true` for a non-empty string of ASCII digits.
#[must_use]
pub fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Extracts `(name, student_id)` from `张三-2021001-...` style text.
///
/// The first two `-` separated fields are used, swapped when the id comes
/// first. Text with fewer than two fields is handed to
/// [`extract_name_and_id_by_digits`].
///
/// # Errors
///
/// Returns [`IdentifyError::NameAndIdNotFound`] when no all-digit id of at
/// least six characters can be found.
pub fn extract_name_and_id(s: &str) -> Result<(String, String), IdentifyError> {
    let cleaned = clean_name(s);
    let fields: Vec<&str> = cleaned
        .split('-')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() < 2 {
        return extract_name_and_id_by_digits(&cleaned);
    }

    let (mut name, mut id) = (fields[0], fields[1]);
    if !is_all_digits(id) && is_all_digits(name) {
        std::mem::swap(&mut name, &mut id);
    }
    if !is_all_digits(id) || id.len() < MIN_ID_LEN {
        return Err(IdentifyError::NameAndIdNotFound { input: cleaned });
    }
    Ok((name.to_string(), id.to_string()))
}

/// Extracts `(name, student_id)` from text such as `220301033刘徐明`.
///
/// The text must contain exactly one run of digits, at least six long.
/// Everything else, trimmed, is the name.
///
/// # Errors
///
/// Returns [`IdentifyError::NameAndIdNotFound`] when there is no such run
/// or nothing is left for the name.
pub fn extract_name_and_id_by_digits(s: &str) -> Result<(String, String), IdentifyError> {
    let not_found = || IdentifyError::NameAndIdNotFound {
        input: s.to_string(),
    };

    let mut runs = DIGIT_RUN.find_iter(s);
    let run = runs.next().ok_or_else(not_found)?;
    if runs.next().is_some() || run.as_str().len() < MIN_ID_LEN {
        return Err(not_found());
    }

    let rest = format!("{}{}", &s[..run.start()], &s[run.end()..]);
    let name = rest.trim_matches(|c: char| c.is_whitespace() || c == '-');
    if name.is_empty() {
        return Err(not_found());
    }
    Ok((name.to_string(), run.as_str().to_string()))
}

/// Returns the longest substring of `a` that also occurs in `b`.
///
/// Comparison is per character, so multi-byte text is never split. Among
/// equally long candidates the one earliest in `a` wins.
#[must_use]
pub fn longest_common_substring<'a>(a: &'a str, b: &str) -> &'a str {
    let a_chars: Vec<(usize, char)> = a.char_indices().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut prev = vec![0usize; b_chars.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0;

    for (i, &(_, ca)) in a_chars.iter().enumerate() {
        let mut cur = vec![0usize; b_chars.len() + 1];
        for (j, &cb) in b_chars.iter().enumerate() {
            if ca == cb {
                cur[j + 1] = prev[j] + 1;
                if cur[j + 1] > best_len {
                    best_len = cur[j + 1];
                    best_end = i + 1;
                }
            }
        }
        prev = cur;
    }

    if best_len == 0 {
        return "";
    }
    let start = a_chars[best_end - best_len].0;
    let end = a_chars.get(best_end).map_or(a.len(), |&(idx, _)| idx);
    &a[start..end]
}

#[derive(Debug, Clone)]
struct LabEntry {
    lab: String,
    upper: String,
    course: String,
}

/// Known lab names and the course each belongs to, in configured order.
#[derive(Debug, Clone, Default)]
pub struct LabCatalog {
    entries: Vec<LabEntry>,
}

/// A lab found in a subject or filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabMatch {
    /// The configured lab name.
    pub lab: String,
    /// Uppercased input with the matched text removed once.
    pub remainder: String,
    /// Course the lab belongs to.
    pub course: String,
}

impl LabCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a lab. A lab registered twice keeps its position and takes the
    /// newer course.
    pub fn insert(&mut self, lab: impl Into<String>, course: impl Into<String>) {
        let lab = lab.into();
        let course = course.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.lab == lab) {
            entry.course = course;
            return;
        }
        self.entries.push(LabEntry {
            upper: lab.to_uppercase(),
            lab,
            course,
        });
    }

    /// Number of labs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no lab is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Course a lab belongs to.
    #[must_use]
    pub fn course_of(&self, lab: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.lab == lab)
            .map(|e| e.course.as_str())
    }

    /// Finds the lab named in `s`, ignoring case.
    ///
    /// An exact substring match wins, in configured order. Otherwise the lab
    /// sharing the longest common substring with `s` is chosen, provided the
    /// shared part is longer than four bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifyError::LabNotFound`] when nothing matches.
    pub fn find_lab(&self, s: &str) -> Result<LabMatch, IdentifyError> {
        let upper = s.to_uppercase();

        let exact = self
            .entries
            .iter()
            .find(|e| !e.upper.is_empty() && upper.contains(&e.upper));
        if let Some(entry) = exact {
            return Ok(LabMatch {
                lab: entry.lab.clone(),
                remainder: upper.replacen(&entry.upper, "", 1),
                course: entry.course.clone(),
            });
        }

        let mut best: Option<(&LabEntry, &str)> = None;
        for entry in &self.entries {
            let common = longest_common_substring(&upper, &entry.upper);
            if common.len() > MIN_COMMON_BYTES
                && best.map_or(true, |(_, longest)| common.len() > longest.len())
            {
                best = Some((entry, common));
            }
        }

        best.map(|(entry, common)| LabMatch {
            lab: entry.lab.clone(),
            remainder: upper.replacen(common, "", 1),
            course: entry.course.clone(),
        })
        .ok_or(IdentifyError::LabNotFound)
    }
}

/// What could be read from one subject or filename.
///
/// Fields that could not be found are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub student_id: String,
    pub course: Option<String>,
    pub lab: Option<String>,
}

impl Candidate {
    /// Returns `true` when both name and student id were found.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() && !self.student_id.is_empty()
    }
}

/// Reads name, id and lab from one subject or filename.
///
/// When the first attempt finds no identity, or a "name" too long to be one,
/// extraction is retried on the text with the lab name removed.
#[must_use]
pub fn extract_candidate(s: &str, catalog: &LabCatalog) -> Candidate {
    let first = extract_name_and_id(s);

    let found = match catalog.find_lab(s) {
        Ok(found) => found,
        Err(_) => {
            let (name, student_id) = first.unwrap_or_default();
            return Candidate {
                name,
                student_id,
                ..Candidate::default()
            };
        }
    };

    let identity = match first {
        Ok((name, id)) if name.len() <= MAX_NAME_BYTES => Ok((name, id)),
        _ => extract_name_and_id(&found.remainder),
    };
    let (name, student_id) = identity.unwrap_or_default();

    Candidate {
        name,
        student_id,
        course: Some(found.course),
        lab: Some(found.lab),
    }
}

/// Everything attributed to one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub name: String,
    pub student_id: String,
    pub course: String,
    /// Labs submitted, de-duplicated in order of discovery.
    pub labs: Vec<String>,
}

/// Attributes an email to a student, a course and one or more labs.
///
/// # Errors
///
/// Returns [`IdentifyError::NoSubject`], [`IdentifyError::NoAttachments`] or
/// [`IdentifyError::NoLab`].
pub fn identify(
    subject: &str,
    attachments: &[String],
    catalog: &LabCatalog,
) -> Result<Identification, IdentifyError> {
    let subject = clean_name(subject);
    if subject.is_empty() {
        return Err(IdentifyError::NoSubject);
    }
    if attachments.is_empty() {
        return Err(IdentifyError::NoAttachments);
    }
    let attachments: Vec<String> = attachments
        .iter()
        .map(|a| strip_attachment_extension(&clean_name(a)).to_string())
        .collect();

    let from_subject = extract_candidate(&subject, catalog);

    if let (Some(lab), true) = (&from_subject.lab, from_subject.has_identity()) {
        let mut labs = vec![lab.clone()];
        for attachment in &attachments {
            match catalog.find_lab(attachment) {
                Ok(found) => labs.push(found.lab),
                Err(e) => debug!(%attachment, error = %e, "No lab in attachment, subject already names one"),
            }
        }
        return Ok(Identification {
            name: from_subject.name,
            student_id: from_subject.student_id,
            course: from_subject.course.unwrap_or_default(),
            labs: unique(labs),
        });
    }

    let Candidate {
        mut name,
        mut student_id,
        course: subject_course,
        lab: subject_lab,
    } = from_subject;
    let mut course = String::new();
    let mut labs = Vec::new();

    for attachment in &attachments {
        let candidate = extract_candidate(attachment, catalog);
        if name.is_empty() {
            name = candidate.name;
        }
        if student_id.is_empty() {
            student_id = candidate.student_id;
        }
        if course.is_empty() {
            course = candidate.course.unwrap_or_default();
        }
        match candidate.lab {
            Some(lab) => labs.push(lab),
            None => warn!(%attachment, "Failed to find lab name from attachment"),
        }
    }

    // a subject without an identity often names a lab only by fuzzy match
    if labs.is_empty() {
        let Some(lab) = subject_lab else {
            return Err(IdentifyError::NoLab);
        };
        labs.push(lab);
        course = subject_course.unwrap_or_default();
    }
    Ok(Identification {
        name,
        student_id,
        course,
        labs: unique(labs),
    })
}

fn unique(labs: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labs.len());
    for lab in labs {
        if !out.contains(&lab) {
            out.push(lab);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LabCatalog {
        let mut catalog = LabCatalog::new();
        catalog.insert("实验一", "Java程序设计");
        catalog.insert("实验二", "Java程序设计");
        catalog.insert("Lab3-Sorting", "Data Structures");
        catalog
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_name_separators() {
        assert_eq!(clean_name("张三_2021001 实验一"), "张三-2021001-实验一");
        assert_eq!(clean_name("张三 - 2021001 -- 实验一"), "张三-2021001-实验一");
        assert_eq!(clean_name("--张三-2021001--"), "张三-2021001");
        assert_eq!(clean_name("  张三。2021001  "), "张三2021001");
    }

    #[test]
    fn test_clean_name_keeps_last_dot() {
        assert_eq!(clean_name("a.b.c.docx"), "a-b-c.docx");
        assert_eq!(clean_name("report.docx"), "report.docx");
    }

    #[test]
    fn test_clean_name_removes_parentheses() {
        assert_eq!(clean_name("张三-2021001-实验一(重交)"), "张三-2021001-实验一");
        assert_eq!(clean_name("张三（补交）-2021001"), "张三-2021001");
        assert_eq!(clean_name("(a)(b)张三"), "张三");
    }

    #[test]
    fn test_clean_name_misordered_parentheses_terminates() {
        assert_eq!(clean_name("张三)-2021001-(实验一"), "张三)-2021001-(实验一");
    }

    #[test]
    fn test_clean_name_stray_close_before_group() {
        assert_eq!(clean_name("a)b(c)d"), "a)bd");
        assert_eq!(clean_name("张三）-2021001（补交）"), "张三）-2021001");
    }

    #[test]
    fn test_strip_attachment_extension() {
        assert_eq!(strip_attachment_extension("a-b.docx"), "a-b");
        assert_eq!(strip_attachment_extension("a-b.RAR"), "a-b");
        assert_eq!(strip_attachment_extension("a-b.png"), "a-b.png");
        assert_eq!(strip_attachment_extension("noext"), "noext");
    }

    #[test]
    fn test_is_all_digits() {
        assert!(is_all_digits("2021001"));
        assert!(!is_all_digits(""));
        assert!(!is_all_digits("20a1"));
        assert!(!is_all_digits("２０２１"));
    }

    #[test]
    fn test_extract_name_and_id_fields() {
        assert_eq!(
            extract_name_and_id("张三-2021001-实验一").unwrap(),
            ("张三".to_string(), "2021001".to_string())
        );
        assert_eq!(
            extract_name_and_id("2021001_张三_实验一").unwrap(),
            ("张三".to_string(), "2021001".to_string())
        );
    }

    #[test]
    fn test_extract_name_and_id_rejects_short_id() {
        assert!(matches!(
            extract_name_and_id("张三-12345-实验一"),
            Err(IdentifyError::NameAndIdNotFound { .. })
        ));
        assert!(extract_name_and_id("实验一-张三").is_err());
    }

    #[test]
    fn test_extract_name_and_id_falls_back_to_digits() {
        assert_eq!(
            extract_name_and_id("220301033刘徐明").unwrap(),
            ("刘徐明".to_string(), "220301033".to_string())
        );
    }

    #[test]
    fn test_extract_by_digits() {
        assert_eq!(
            extract_name_and_id_by_digits("李四 2021001").unwrap(),
            ("李四".to_string(), "2021001".to_string())
        );
        assert!(extract_name_and_id_by_digits("2021001").is_err());
        assert!(extract_name_and_id_by_digits("李四 12345").is_err());
        assert!(extract_name_and_id_by_digits("李四 2021001 实验2").is_err());
        assert!(extract_name_and_id_by_digits("李四").is_err());
    }

    #[test]
    fn test_longest_common_substring() {
        assert_eq!(longest_common_substring("张三实验一报告", "实验一"), "实验一");
        assert_eq!(longest_common_substring("abcxyz", "xyzabc"), "abc");
        assert_eq!(longest_common_substring("abc", "def"), "");
        assert_eq!(longest_common_substring("", "abc"), "");
    }

    #[test]
    fn test_find_lab_exact_is_case_insensitive() {
        let found = catalog().find_lab("张三-2021001-lab3-sorting").unwrap();
        assert_eq!(found.lab, "Lab3-Sorting");
        assert_eq!(found.course, "Data Structures");
        assert_eq!(found.remainder, "张三-2021001-");
    }

    #[test]
    fn test_find_lab_prefers_configured_order() {
        let found = catalog().find_lab("实验二和实验一").unwrap();
        assert_eq!(found.lab, "实验一");
    }

    #[test]
    fn test_find_lab_fuzzy() {
        let found = catalog().find_lab("张三-2021001-Lab3Sorting").unwrap();
        assert_eq!(found.lab, "Lab3-Sorting");
        assert_eq!(found.remainder, "张三-2021001-LAB3");
    }

    #[test]
    fn test_find_lab_short_overlap_is_not_enough() {
        // "实验" is six bytes, but "LAB" is only three
        assert_eq!(catalog().find_lab("实验").unwrap().lab, "实验一");
        assert_eq!(catalog().find_lab("LAB"), Err(IdentifyError::LabNotFound));
        assert_eq!(LabCatalog::new().find_lab("实验一"), Err(IdentifyError::LabNotFound));
    }

    #[test]
    fn test_catalog_insert_updates_course() {
        let mut catalog = catalog();
        catalog.insert("实验一", "C语言");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.course_of("实验一"), Some("C语言"));
    }

    #[test]
    fn test_extract_candidate_retries_without_lab() {
        let candidate = extract_candidate("实验一220301033刘徐明", &catalog());
        assert_eq!(candidate.name, "刘徐明");
        assert_eq!(candidate.student_id, "220301033");
        assert_eq!(candidate.lab.as_deref(), Some("实验一"));
        assert_eq!(candidate.course.as_deref(), Some("Java程序设计"));
    }

    #[test]
    fn test_extract_candidate_without_lab_keeps_identity() {
        let candidate = extract_candidate("张三-2021001", &catalog());
        assert!(candidate.has_identity());
        assert_eq!(candidate.lab, None);
    }

    #[test]
    fn test_identify_from_subject() {
        let id = identify(
            "张三-2021001-实验一",
            &names(&["张三-2021001-实验一.docx", "张三-2021001-实验二.zip"]),
            &catalog(),
        )
        .unwrap();
        assert_eq!(id.name, "张三");
        assert_eq!(id.student_id, "2021001");
        assert_eq!(id.course, "Java程序设计");
        assert_eq!(id.labs, names(&["实验一", "实验二"]));
    }

    #[test]
    fn test_identify_skips_attachment_without_lab() {
        let id = identify(
            "张三-2021001-实验一",
            &names(&["截图.zip", "张三-2021001-实验二.docx"]),
            &catalog(),
        )
        .unwrap();
        assert_eq!(id.labs, names(&["实验一", "实验二"]));
    }

    #[test]
    fn test_identify_from_attachments() {
        let id = identify(
            "作业提交",
            &names(&["220301033刘徐明实验二.docx", "刘徐明-220301033-实验二.zip"]),
            &catalog(),
        )
        .unwrap();
        assert_eq!(id.name, "刘徐明");
        assert_eq!(id.student_id, "220301033");
        assert_eq!(id.course, "Java程序设计");
        assert_eq!(id.labs, names(&["实验二"]));
    }

    #[test]
    fn test_identify_generic_subject_does_not_add_lab() {
        let catalog = catalog();
        assert_eq!(catalog.find_lab("实验报告").unwrap().lab, "实验一");

        let id = identify("实验报告", &names(&["张三-2021001-实验二.docx"]), &catalog).unwrap();
        assert_eq!(id.name, "张三");
        assert_eq!(id.student_id, "2021001");
        assert_eq!(id.labs, names(&["实验二"]));
    }

    #[test]
    fn test_identify_falls_back_to_subject_lab() {
        let id = identify("实验一", &names(&["张三-2021001.docx"]), &catalog()).unwrap();
        assert_eq!(id.name, "张三");
        assert_eq!(id.course, "Java程序设计");
        assert_eq!(id.labs, names(&["实验一"]));
    }

    #[test]
    fn test_identify_errors() {
        let catalog = catalog();
        assert_eq!(
            identify(" 。", &names(&["a.docx"]), &catalog),
            Err(IdentifyError::NoSubject)
        );
        assert_eq!(
            identify("张三-2021001-实验一", &[], &catalog),
            Err(IdentifyError::NoAttachments)
        );
        assert_eq!(
            identify("张三-2021001", &names(&["张三-2021001.docx"]), &catalog),
            Err(IdentifyError::NoLab)
        );
    }
}
