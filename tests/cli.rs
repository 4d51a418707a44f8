//! End-to-end tests of the `mytools` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LISTING: &str = "SeqNum,Date,From,To,Subject,Attachments\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        };
        ws.add_file("config.json", "{}");
        ws
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    fn read(&self, path: &str) -> String {
        fs::read_to_string(self.dir.path().join(path)).expect("Failed to read file")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("mytools").expect("binary exists");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path().join("config.json"));
        cmd
    }
}

// ============================================================================
// Small tools
// ============================================================================

#[test]
fn test_password() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["password", "-s", "3", "-t", "12"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Generated Password : \S{12}\n$").unwrap());
}

#[test]
fn test_password_too_many_specials() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["password", "-s", "5", "-t", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: number of special characters"));
}

#[test]
fn test_lotto_stops_on_enter() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["lotto", "-s", "1", "-e", "10", "-m", "10"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("You have chosen"));
}

#[test]
fn test_lotto_invalid_range() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["lotto", "-s", "10", "-e", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("start number must be less than end number"));
}

#[test]
fn test_web2bin_defaults() {
    let ws = Workspace::new();
    ws.add_file("base64.txt", "aGVsbG8_\n");

    ws.cmd().arg("web2bin").assert().success();

    assert_eq!(fs::read(ws.path().join("out.bin")).unwrap(), b"hello?");
}

#[test]
fn test_rm_str_without_confirmation() {
    let ws = Workspace::new();
    ws.add_file("docs/副本-report.docx", "x");
    ws.add_file("docs/notes.txt", "x");

    ws.cmd()
        .args(["rm-str", "-d", "docs", "-s", "副本-", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("renamed 1 entries"));

    assert!(ws.path().join("docs/report.docx").is_file());
    assert!(ws.path().join("docs/notes.txt").is_file());
}

#[test]
fn test_rm_str_declined() {
    let ws = Workspace::new();
    ws.add_file("docs/副本-report.docx", "x");

    ws.cmd()
        .args(["rm-str", "-d", "docs", "-s", "副本-"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("renamed 0 entries"));

    assert!(ws.path().join("docs/副本-report.docx").is_file());
}

#[test]
fn test_file_by_date() {
    let ws = Workspace::new();
    ws.add_file("images/a.jpg", "x");
    fs::create_dir_all(ws.path().join("images/sub")).unwrap();

    ws.cmd()
        .args(["file-by-date", "-b", "images"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mv "));

    assert!(!ws.path().join("images/a.jpg").exists());
    let moved = fs::read_dir(ws.path().join("images"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .any(|dir| dir.join("a.jpg").is_file());
    assert!(moved, "a.jpg should be inside a dated folder");
}

// ============================================================================
// Rosters and labs
// ============================================================================

#[test]
fn test_lab_flags() {
    let ws = Workspace::new();
    ws.add_file("namelist.csv", "name,no\n张三,2021001\n李四,2021002\n");
    ws.add_file("reports/张三-2021001-实验一.docx", "x");
    ws.add_file("reports/王五-2021003-实验一.doc", "x");
    ws.add_file("reports/张三2021001.docx", "x");

    ws.cmd()
        .args(["lab", "-d", "reports", "-l", "实验一"])
        .assert()
        .success()
        .stdout("实验一\nY\nN\n")
        .stderr(predicate::str::contains("Illegal file name:\n张三2021001.docx"))
        .stderr(predicate::str::contains("Not found:\n王五-2021003-实验一.doc"));
}

#[test]
fn test_lab_debug_output() {
    let ws = Workspace::new();
    ws.add_file("namelist.csv", "name,no\n张三,2021001\n");
    ws.add_file("张三-2021001-实验一.docx", "x");

    ws.cmd()
        .args(["lab", "-l", "实验一", "-D"])
        .assert()
        .success()
        .stdout("name,no,实验一\n张三,2021001,Y\n");
}

#[test]
fn test_student_from_settings_dataset() {
    let ws = Workspace::new();
    let dataset = ws.add_file(
        "all.csv",
        "Name,No,Class,Grade\n张三,2021001,计科1班,2021\n李四,2021002,计科2班,2021\n",
    );
    let settings = serde_json::json!({ "lab": { "all_student": dataset } });
    ws.add_file("config.json", &settings.to_string());

    ws.cmd()
        .args(["student", "-k", "2021002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("student 李四 found with result: Name: 李四"));

    ws.cmd()
        .args(["student", "-k", "王五"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Can not find any student with keyword: 王五"));
}

#[test]
fn test_student_requires_key() {
    let ws = Workspace::new();
    let dataset = ws.add_file("all.csv", "Name,No,Class,Grade\n");

    ws.cmd()
        .arg("student")
        .arg("-d")
        .arg(&dataset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: key is empty"));
}

// ============================================================================
// Email listings
// ============================================================================

#[test]
fn test_email_rmdup() {
    let ws = Workspace::new();
    ws.add_file(
        "email.csv",
        &format!(
            "{LISTING}\
             3,2023-10-09T10:00:00+08:00,a@x.cn,ta@qq.com,late,late.docx\n\
             1,2023-10-09T09:00:00+08:00,b@x.cn,ta@qq.com,early,early.docx\n\
             9,2023-10-09T10:00:00+08:00,a@x.cn,ta@qq.com,late,late.docx\n"
        ),
    );

    ws.cmd()
        .args(["email", "rmdup", "-f", "email.csv", "-o", "dedup.csv"])
        .assert()
        .success();

    let out = ws.read("dedup.csv");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,"));
    assert!(lines[2].starts_with("3,"));
    assert!(ws.path().join("logfile.txt").is_file());
}

#[test]
fn test_email_rmdup_requires_output() {
    let ws = Workspace::new();
    ws.add_file("email.csv", LISTING);

    ws.cmd()
        .args(["email", "rmdup", "-f", "email.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: the listing to write is required"));
}

#[test]
fn test_email_course() {
    let ws = Workspace::new();
    let class = ws.add_file("class1.csv", "姓名,学号\n张三,2021001\n李四,2021002\n");
    let settings = serde_json::json!({
        "courses": [
            { "name": "Java程序设计", "labs": ["实验一", "实验二"], "classes": [class] }
        ]
    });
    ws.add_file("config.json", &settings.to_string());
    ws.add_file(
        "email.csv",
        &format!(
            "{LISTING}\
             1,2023-10-09T09:00:00+08:00,s1@x.cn,ta@qq.com,张三-2021001-实验一,张三-2021001-实验一.docx\n\
             2,2023-10-09T09:30:00+08:00,s2@x.cn,ta@qq.com,作业,\"220301033刘徐明实验二.docx\"\n\
             3,2023-10-09T10:00:00+08:00,s3@x.cn,ta@qq.com,hello,hello.zip\n"
        ),
    );

    ws.cmd()
        .args(["email", "course", "--log-file", "course.log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records written"));

    let out = ws.read("email_course.csv");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "姓名,学号,课程,实验名,提交时间,提交人邮件地址,邮件主题,附件名,备注");
    assert!(lines[1].starts_with("张三,2021001,Java程序设计,实验一,2023-10-09 09:00:00,s1@x.cn"));
    assert!(lines[1].ends_with(",Success"));
    assert!(lines[2].starts_with("刘徐明,220301033,Java程序设计,实验二"));
    assert!(lines[2].ends_with(",Not in roster"));
    assert!(lines[3].contains("Failed"));
    assert!(ws.path().join("course.log").is_file());
}

#[test]
fn test_email_course_rejects_foreign_listing() {
    let ws = Workspace::new();
    ws.add_file("email.csv", "a,b,c\n");

    ws.cmd()
        .args(["email", "course"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("header should be"));
}

#[test]
fn test_email_fetch_requires_credentials() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("email")
        .assert()
        .failure()
        .stderr(predicate::str::contains("username or password is empty"));
}
