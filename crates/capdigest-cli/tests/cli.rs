use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("capdigest"))
}

/// Ethernet + IPv4 + UDP frame, 10.0.0.1:5000 -> 10.0.0.2:6000.
fn udp_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    frame.extend_from_slice(&[0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f]);
    frame.extend_from_slice(&0x0800u16.to_be_bytes());

    let total_len = (20 + 8 + payload.len()) as u16;
    let mut ip = [0u8; 20];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&total_len.to_be_bytes());
    ip[8] = 64;
    ip[9] = 17;
    ip[12..16].copy_from_slice(&[10, 0, 0, 1]);
    ip[16..20].copy_from_slice(&[10, 0, 0, 2]);
    frame.extend_from_slice(&ip);

    frame.extend_from_slice(&5000u16.to_be_bytes());
    frame.extend_from_slice(&6000u16.to_be_bytes());
    frame.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn legacy_capture(count: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for idx in 0..count {
        let frame = udp_frame(b"hello");
        out.extend_from_slice(&(1_700_000_000 + idx).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(&frame);
    }
    out
}

fn write_capture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write capture");
    path
}

#[test]
fn help_lists_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--max-packets").and(contains("--json")));
}

#[test]
fn text_summary_goes_to_stdout() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "one.pcap", &legacy_capture(1));

    cmd()
        .arg(input)
        .assert()
        .success()
        .stdout(
            contains("Processing PCAP format file")
                .and(contains("Packet 1:"))
                .and(contains("UDP: 5000 -> 6000"))
                .and(contains("hello")),
        );
}

#[test]
fn json_output_is_valid() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "two.pcap", &legacy_capture(2));

    let assert = cmd().arg(input).arg("--json").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["format"], "pcap");
    assert_eq!(value["packets"], 2);
    assert_eq!(value["link_type"], 1);
    assert!(value["text"].as_str().unwrap().contains("Packet 2:"));
}

#[test]
fn pretty_requires_json() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "one.pcap", &legacy_capture(1));

    cmd().arg(input).arg("--pretty").assert().failure();
}

#[test]
fn max_packets_limits_entries() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "three.pcap", &legacy_capture(3));

    cmd()
        .arg(input)
        .arg("--max-packets")
        .arg("1")
        .assert()
        .success()
        .stdout(contains("Packet 1:").and(contains("Packet 2:").not()));
}

#[test]
fn output_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "one.pcap", &legacy_capture(1));
    let output = temp.path().join("out").join("summary.txt");

    cmd()
        .arg(input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("OK: summary written"));

    let written = fs::read_to_string(&output).expect("summary file");
    assert!(written.starts_with("Processing PCAP format file\n\n"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "one.pcap", &legacy_capture(1));
    let output = temp.path().join("summary.txt");

    cmd()
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn output_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "one.pcap", &legacy_capture(1));

    cmd()
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("output path must differ from input"));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcapng");

    cmd()
        .arg(missing)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.txt", &legacy_capture(1));

    cmd()
        .arg(input)
        .assert()
        .code(2)
        .stderr(contains("unsupported input format"));
}

#[test]
fn unrecognized_magic_reports_format_error() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "bogus.pcap", b"not a capture at all");

    cmd()
        .arg(input)
        .assert()
        .code(2)
        .stdout(contains("Processing").not())
        .stderr(contains("unrecognized capture format").and(contains("hint:")));
}

#[test]
fn truncated_capture_keeps_partial_output() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = legacy_capture(2);
    bytes.extend_from_slice(&[0u8; 7]);
    let input = write_capture(temp.path(), "cut.pcap", &bytes);

    cmd()
        .arg(input)
        .assert()
        .code(2)
        .stdout(contains("Packet 2:"))
        .stderr(contains("truncated pcap record header"));
}

#[test]
fn glob_with_single_match_is_resolved() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path(), "only.pcap", &legacy_capture(1));
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg(pattern)
        .assert()
        .success()
        .stdout(contains("Packet 1:"));
}

#[test]
fn glob_with_multiple_matches_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path(), "a.pcap", &legacy_capture(1));
    write_capture(temp.path(), "b.pcap", &legacy_capture(1));
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg(pattern)
        .assert()
        .code(2)
        .stderr(contains("multiple files match pattern"));
}
