#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_ctf").to_string()
}

const USERS_JSON: &str = r#"{"users":[{"id":1,"name":"Alice","role":"admin"},{"id":2,"name":"Bob","role":"user"},{"id":3,"name":"Charlie","role":"dev"}]}"#;

const USERS_CTF: &str = "users@3|id,name,role:\n  1|Alice|admin\n  2|Bob|user\n  3|Charlie|dev";

fn run_with_stdin(args: &[&str], input: &str) -> std::process::Output {
    let mut child = Command::new(bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn cli_encode_decode_roundtrip_files() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("users.json");
    let encoded = dir.path().join("users.ctf");
    let decoded = dir.path().join("back.json");
    std::fs::write(&json, USERS_JSON).unwrap();

    let st = Command::new(bin())
        .arg("encode")
        .arg(&json)
        .arg("-o")
        .arg(&encoded)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read_to_string(&encoded).unwrap(), USERS_CTF);

    let st = Command::new(bin())
        .arg("decode")
        .arg(&encoded)
        .arg("-o")
        .arg(&decoded)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read_to_string(&decoded).unwrap(), USERS_JSON);
}

#[test]
fn cli_encode_from_stdin() {
    let out = run_with_stdin(&["encode", "-", "--delimiter", "comma"], USERS_JSON);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("users@3,id,name,role:\n  1,Alice,admin"));
}

#[test]
fn cli_encode_stats_go_to_stderr() {
    let out = run_with_stdin(&["encode", "--stats"], USERS_JSON);
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), format!("{}\n", USERS_CTF));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Statistics:"));
    assert!(stderr.contains(&format!("JSON size:   {} bytes", USERS_JSON.len())));
}

#[test]
fn cli_decode_pretty() {
    let out = run_with_stdin(&["decode", "--pretty"], "a:1\nb:\n  c:[x y]");
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": [\n      \"x\",\n      \"y\"\n    ]\n  }\n}\n"
    );
}

#[test]
fn cli_decode_strict_failure_exits_nonzero() {
    let input = "t@2|a,b:\n1|x\n2";
    let out = run_with_stdin(&["decode"], input);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with("ctf: Parse error at line 3"));

    let out = run_with_stdin(&["decode", "--lenient"], input);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "{\"t\":[{\"a\":1,\"b\":\"x\"},{\"a\":2,\"b\":\"\"}]}\n"
    );
}

#[test]
fn cli_invalid_json_exits_nonzero() {
    let out = run_with_stdin(&["encode"], "{not json");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr).unwrap().contains("invalid JSON input"));
}

#[test]
fn cli_missing_input_file() {
    let dir = tempdir().unwrap();
    let out = Command::new(bin())
        .arg("encode")
        .arg(dir.path().join("missing.json"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr).unwrap().starts_with("ctf: IO error"));
}

#[test]
fn cli_no_references_flag() {
    let json = r#"{"a":"a repeated string value","b":"a repeated string value","c":"a repeated string value","d":"a repeated string value"}"#;

    let out = run_with_stdin(&["encode", "--references", "on"], json);
    assert!(out.status.success());
    assert!(String::from_utf8(out.stdout).unwrap().starts_with("^1="));

    let out = run_with_stdin(&["encode", "--no-references"], json);
    assert!(out.status.success());
    assert!(!String::from_utf8(out.stdout).unwrap().contains('^'));
}

#[test]
fn cli_optimize_report() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("users.json");
    std::fs::write(&json, USERS_JSON).unwrap();

    let out = Command::new(bin()).arg("optimize").arg(&json).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Strategy:         tabular-heavy"));
    assert!(stdout.contains("Delimiter:        pipe (|)"));
    assert!(stdout.contains("Tabular arrays:   1"));
    assert!(stdout.contains(USERS_CTF));
}

#[test]
fn cli_requires_subcommand() {
    let out = Command::new(bin()).output().unwrap();
    assert!(!out.status.success());
}
