use assert_cmd::Command;
use assert_fs::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../survey-spec/tests/fixtures/weekly.json")
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn check_reports_valid_definition() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("survey-wizard")?
        .arg("check")
        .arg("--survey")
        .arg(fixture())
        .output()?;
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Survey 'weekly' (version 2024-01) is valid: 5 items"));
    Ok(())
}

#[test]
fn check_rejects_duplicate_keys() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let survey = temp.child("broken.json");
    survey.write_str(
        &json!({
            "id": "broken",
            "version": "1",
            "root": {
                "key": "broken",
                "items": [
                    { "type": "single", "key": "broken.q1" },
                    { "type": "single", "key": "broken.q1" }
                ]
            }
        })
        .to_string(),
    )?;
    Command::cargo_bin("survey-wizard")?
        .arg("check")
        .arg("--survey")
        .arg(survey.path())
        .assert()
        .failure();
    Ok(())
}

#[test]
fn pages_follow_participant_flags() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let context = temp.child("context.json");
    context.write_str(r#"{ "participantFlags": { "prev": "1" } }"#)?;
    let output = Command::cargo_bin("survey-wizard")?
        .arg("pages")
        .arg("--survey")
        .arg(fixture())
        .arg("--context")
        .arg(context.path())
        .output()?;
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Pages: 3"));
    assert!(stdout.contains("  1: weekly.q2"));
    Ok(())
}

#[test]
fn validate_fails_without_required_answer() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::TempDir::new()?;
    let responses = temp.path().join("responses.json");
    fs::write(&responses, "[]")?;
    let output = Command::cargo_bin("survey-wizard")?
        .arg("validate")
        .arg("--survey")
        .arg(fixture())
        .arg("--responses")
        .arg(&responses)
        .output()?;
    assert!(!output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Validation result: invalid"));
    assert!(stdout.contains("weekly.q1 - rule r1"));
    Ok(())
}

#[test]
fn wizard_walks_pages_and_submits() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("survey-wizard")?
        .arg("wizard")
        .arg("--survey")
        .arg(fixture())
        .arg("--answers-json")
        .write_stdin("0\nfeeling fine\n")
        .output()?;
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Page 1/2"));
    assert!(stdout.contains("Page 2/2"));
    assert!(stdout.contains("Answers (CBOR hex): "));
    assert!(stdout.contains("\"feeling fine\""));
    Ok(())
}

#[test]
fn wizard_blocks_until_required_answer_given() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("survey-wizard")?
        .arg("wizard")
        .arg("--survey")
        .arg(fixture())
        .env("SURVEY_WIZARD_LANGUAGE", "nl")
        .write_stdin("\n0\n\n")
        .output()?;
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("weekly.q1: rule r1 not satisfied"));
    assert!(stdout.contains("Survey: Wekelijkse vragenlijst"));
    assert!(stdout.contains("Done"));
    Ok(())
}

#[test]
fn wizard_fails_when_input_runs_out() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("survey-wizard")?
        .arg("wizard")
        .arg("--survey")
        .arg(fixture())
        .write_stdin("")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn schema_prints_definition_schema() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("survey-wizard")?
        .arg("schema")
        .output()?;
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(schema["title"], "Survey");
    Ok(())
}
