//! End-to-end runs of the `transcript` binary against a session file on disk.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use crate::common::{run_cli, session_json, write_config};

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    std::fs::write(&session, serde_json::to_string_pretty(&session_json()).unwrap()).unwrap();
    (dir, session)
}

fn read_session(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn add_updates_the_session_file() {
    let (dir, session) = workspace();
    let output = run_cli(
        dir.path(),
        &[
            "--session", "session.json", "add", "--code", "BI201", "--name", "Biology",
            "--lang", "EN", "--credit", "5", "--grade", "A",
        ],
        None,
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).lines().any(|line| line.starts_with("+ BI201")));
    assert!(stdout(&output).contains("2.37 ➜ 2.80"));

    let saved = read_session(&session);
    assert_eq!(saved["added_course_list"][0]["course_code"], "BI201");
    assert_eq!(saved["added_course_list"][0]["course_grade_point"], 4.0);
    assert_eq!(saved["modified_course_list"].as_array().unwrap().len(), 6);
    assert_eq!(saved["reader_settings"]["zoom"], 1.5);
}

#[test]
fn show_leaves_the_file_untouched() {
    let (dir, session) = workspace();
    let before = std::fs::read(&session).unwrap();

    let output = run_cli(dir.path(), &["-s", "session.json", "show", "--modified-only"], None);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Course Code"));
    assert!(!stdout(&output).contains('➜'));
    assert_eq!(std::fs::read(&session).unwrap(), before);
}

#[test]
fn removing_an_unknown_course_is_a_recoverable_error() {
    let (dir, session) = workspace();
    let before = std::fs::read(&session).unwrap();

    let output = run_cli(dir.path(), &["-s", "session.json", "remove", "ZZ999"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("ZZ999"));
    assert_eq!(std::fs::read(&session).unwrap(), before);
}

#[test]
fn missing_session_argument_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["show"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no session file"));
}

#[test]
fn repeated_sort_flips_direction_across_runs() {
    let (dir, session) = workspace();

    let first = run_cli(dir.path(), &["-s", "session.json", "sort", "credit"], None);
    assert_eq!(first.status.code(), Some(0), "stderr: {}", stderr(&first));
    assert_eq!(read_session(&session)["sorting"]["should_reverse"], false);

    let second = run_cli(dir.path(), &["-s", "session.json", "sort", "credit"], None);
    assert_eq!(second.status.code(), Some(0), "stderr: {}", stderr(&second));
    let saved = read_session(&session);
    assert_eq!(saved["sorting"]["sort_key"], "course_credit");
    assert_eq!(saved["sorting"]["should_reverse"], true);
    assert_eq!(saved["modified_course_list"][0]["course_credit"], 4);
}

#[test]
fn filter_narrows_and_lists_values() {
    let (dir, session) = workspace();

    let output = run_cli(dir.path(), &["-s", "session.json", "filter", "lang", "TR"], None);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let saved = read_session(&session);
    assert_eq!(saved["filtering"][0]["filter_key"], "course_lang");
    assert_eq!(saved["modified_course_list"].as_array().unwrap().len(), 2);

    let listing = run_cli(dir.path(), &["-s", "session.json", "filters"], None);
    let text = stdout(&listing);
    assert!(text.contains("course_lang in [TR]"));
    assert!(text.contains("course_lang: EN, TR"));

    let cleared = run_cli(dir.path(), &["-s", "session.json", "filter", "--clear"], None);
    assert_eq!(cleared.status.code(), Some(0), "stderr: {}", stderr(&cleared));
    assert_eq!(read_session(&session)["modified_course_list"].as_array().unwrap().len(), 5);
}

#[test]
fn missing_required_resource_is_fatal() {
    let (dir, session) = workspace();
    let missing = dir.path().join("models").join("parser.bin");
    write_config(
        dir.path(),
        &format!("[startup]\nrequired_paths = [{:?}]\n", missing.display().to_string()),
    );
    let before = std::fs::read(&session).unwrap();

    let output = run_cli(dir.path(), &["-s", "session.json", "remove", "CS101"], None);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("parser.bin"));
    assert_eq!(std::fs::read(&session).unwrap(), before);
}

#[test]
fn scratch_is_cleared_and_working_dirs_created() {
    let (dir, _session) = workspace();
    let scratch = dir.path().join("scratch");
    let working = dir.path().join("work").join("cache");
    std::fs::create_dir_all(scratch.join("stale")).unwrap();
    write_config(
        dir.path(),
        &format!(
            "[startup]\nworking_dirs = [{:?}]\nscratch_dirs = [{:?}]\n",
            working.display().to_string(),
            scratch.display().to_string()
        ),
    );

    let output = run_cli(dir.path(), &["-s", "session.json", "show"], None);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(working.is_dir());
    assert!(!scratch.exists());
}

#[cfg(unix)]
#[test]
fn refused_verification_exits_with_three() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "[verification]\ncommand = \"sh\"\nargs = [\"-c\", \"exit 1\", \"verifier\"]\npoll_interval_ms = 5\n",
    );

    let output = run_cli(
        dir.path(),
        &["verify", "--match-id", "m-7", "--username", "alice"],
        Some("secret\n"),
    );
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
}

#[cfg(unix)]
#[test]
fn accepted_verification_prints_verified() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "[verification]\ncommand = \"sh\"\nargs = [\"-c\", \"read pw; [ \\\"$pw\\\" = secret ] && [ \\\"$1\\\" = alice ]\", \"verifier\"]\n",
    );

    let output = run_cli(
        dir.path(),
        &["verify", "--match-id", "m-7", "--username", "alice"],
        Some("secret\n"),
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "verified");
}

#[test]
fn verify_without_a_configured_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(
        dir.path(),
        &["verify", "--match-id", "m-7", "--username", "alice"],
        Some("secret\n"),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("verification"));
}
