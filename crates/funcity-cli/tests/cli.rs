//! End-to-end CLI tests, in the style of the teacher's `faxc-drv` e2e suite.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_source(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn help_mentions_usage() {
    let mut cmd = Command::cargo_bin("funcity").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn renders_a_template_file_to_stdout() {
    let file = write_source("Hello{{add 123 456}}World");
    let mut cmd = Command::cargo_bin("funcity").unwrap();
    cmd.arg(file.path());
    cmd.assert().success().stdout(predicate::eq("Hello579World"));
}

#[test]
fn sequence_flag_prints_one_value_per_line() {
    let file = write_source("{{for i [1 2 3]}}X{{end}}");
    let mut cmd = Command::cargo_bin("funcity").unwrap();
    cmd.arg(file.path()).arg("--sequence");
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn code_mode_flag_parses_a_bare_expression() {
    let file = write_source("add 1 2");
    let mut cmd = Command::cargo_bin("funcity").unwrap();
    cmd.arg(file.path()).arg("--mode").arg("code").arg("--sequence");
    cmd.assert().success().stdout(predicate::str::contains("3"));
}

#[test]
fn an_undefined_variable_reports_an_error_and_exits_nonzero() {
    let file = write_source("{{nonexistent 1}}");
    let mut cmd = Command::cargo_bin("funcity").unwrap();
    cmd.arg(file.path());
    cmd.assert().failure().stderr(predicate::str::contains("error"));
}

#[test]
fn reads_from_stdin_when_no_file_given() {
    let mut cmd = Command::cargo_bin("funcity").unwrap();
    cmd.write_stdin("just text");
    cmd.assert().success().stdout(predicate::eq("just text"));
}
