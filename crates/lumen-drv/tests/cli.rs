//! End-to-end exercise of the `lumenc` binary itself, per `spec.md` §6's
//! CLI contract: exit 255 on argument-count error, nonzero on compilation
//! error, 0 on success. Complements `lumen_drv::compile`'s own unit tests
//! (which call the library function directly) by driving the actual
//! process a user invokes.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn wrong_argument_count_exits_255() {
    Command::cargo_bin("lumenc")
        .expect("binary built")
        .arg("only-one-arg")
        .assert()
        .code(255)
        .stderr(predicate::str::contains("usage:"));
}

#[test]
fn no_arguments_exits_255() {
    Command::cargo_bin("lumenc")
        .expect("binary built")
        .assert()
        .code(255);
}

#[test]
fn valid_source_compiles_and_writes_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.lumen");
    let output = dir.path().join("out.o");
    fs::write(&input, "let x: float = 3;").expect("write source");

    Command::cargo_bin("lumenc")
        .expect("binary built")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn a_type_error_exits_nonzero_and_writes_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.lumen");
    let output = dir.path().join("out.o");
    fs::write(&input, "let x = y + 1;").expect("write source");

    Command::cargo_bin("lumenc")
        .expect("binary built")
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));

    assert!(!output.exists());
}

#[test]
fn a_missing_input_file_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("missing.lumen");
    let output = dir.path().join("out.o");

    Command::cargo_bin("lumenc")
        .expect("binary built")
        .arg(&input)
        .arg(&output)
        .assert()
        .failure();
}
