#![cfg(not(target_arch = "wasm32"))]

use std::fs;

use mbs_format::test_utils::{common_payload, module, record, words, PayloadBuilder};
use mbs_format::FourCC;
use tempfile::tempdir;

fn minimal_module() -> Vec<u8> {
    module(1, FourCC::CVER, &common_payload(1, &[]))
}

#[test]
fn dumps_module_to_stdout() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("shader.bin");
    fs::write(&in_path, minimal_module()).unwrap();

    let assert = assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.starts_with("MBS2 (136 bytes payload)\n"));
    assert!(stdout.contains("\n                #version 100 es\n"));
    assert!(stdout.ends_with("<empty>\n"));
}

#[test]
fn indent_and_output_options() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("shader.bin");
    let out_path = dir.path().join("report.txt");
    fs::write(&in_path, minimal_module()).unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .args(["--indent", "2", "--output"])
        .arg(&out_path)
        .assert()
        .success()
        .stdout("");

    let report = fs::read_to_string(&out_path).unwrap();
    assert!(report.contains("\n  VEHW (12 bytes payload)\n"));
    assert!(report.contains("\n        #version 100 es\n"));
}

#[test]
fn oversized_indent_is_rejected() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("shader.bin");
    fs::write(&in_path, minimal_module()).unwrap();

    let assert = assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .args(["--indent", "18446744073709551615"])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("--indent"), "{stderr}");
}

#[test]
fn hex_dump_by_extension() {
    let payload = PayloadBuilder::new()
        .words(&[2, 0])
        .record(FourCC::GEOM, &words(&[1]))
        .finish();
    let text = hex::encode(record(FourCC::MPB1, &payload));

    let dir = tempdir().unwrap();
    let in_path = dir.path().join("program.hex");
    fs::write(&in_path, format!("{}\n{}\n", &text[..16], &text[16..])).unwrap();

    let assert = assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.starts_with("MPB1 (20 bytes payload)\n"));
    assert!(stdout.contains("    GEOM (4 bytes payload)\n"));
}

#[test]
fn format_override_skips_detection() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("module.hex");
    fs::write(&in_path, minimal_module()).unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .args(["--format", "module"])
        .assert()
        .success();
}

#[test]
fn decode_errors_fail_with_context() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("shader.bin");
    let mut bytes = minimal_module();
    bytes.push(0);
    fs::write(&in_path, bytes).unwrap();

    let assert = assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("decode "), "{stderr}");
    assert!(stderr.contains("1 bytes left unconsumed"), "{stderr}");
}

#[test]
fn unrecognized_input_fails() {
    let dir = tempdir().unwrap();
    let in_path = dir.path().join("junk.bin");
    fs::write(&in_path, b"JUNK").unwrap();

    let assert = assert_cmd::cargo::cargo_bin_cmd!("mbs-dump")
        .arg(&in_path)
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("unrecognized input"), "{stderr}");
}
