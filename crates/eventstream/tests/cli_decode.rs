#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use eventstream::codec::{names, HeaderValue, Headers, Message};

fn unique_temp_file(tag: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "eventstream-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let path = dir.join("capture.bin");
    std::fs::write(&path, contents).expect("capture should be writable");
    path
}

fn event(event_type: &str, payload: &str) -> Vec<u8> {
    let mut headers = Headers::new();
    headers.insert(names::MESSAGE_TYPE.into(), HeaderValue::from("event"));
    headers.insert(names::EVENT_TYPE.into(), HeaderValue::from(event_type));
    Message::new(headers, payload.as_bytes().to_vec())
        .encode()
        .expect("message should encode")
        .to_vec()
}

fn capture() -> Vec<u8> {
    let mut data = event("Records", "{\"n\":1}");
    data.extend_from_slice(&event("Stats", "{\"bytes\":7}"));
    data.extend_from_slice(&event("Records", "{\"n\":2}"));
    data
}

fn eventstream(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_eventstream"))
        .args(["--log-level", "off"])
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("eventstream should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

#[test]
fn decode_prints_one_json_line_per_message() {
    let path = unique_temp_file("decode", &capture());
    let output = eventstream(&["decode", path.to_str().unwrap(), "--format", "json"]);

    assert_eq!(output.status.code(), Some(0));
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["index"], 0);
    assert_eq!(lines[0]["event_type"], "Records");
    assert_eq!(lines[0]["message_type"], "event");
    assert_eq!(lines[0]["payload_encoding"], "utf8");
    assert_eq!(lines[0]["payload"], "{\"n\":1}");
    assert_eq!(lines[1]["event_type"], "Stats");
}

#[test]
fn decode_filters_by_event_type_and_count() {
    let path = unique_temp_file("filter", &capture());
    let output = eventstream(&[
        "decode",
        path.to_str().unwrap(),
        "--event-types",
        "Records",
        "--count",
        "1",
        "--chunk-size",
        "3",
        "--format",
        "json",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["payload"], "{\"n\":1}");
}

#[test]
fn decode_corrupt_stream_exits_data_invalid() {
    let mut data = capture();
    let last = data.len() - 1;
    data[last] ^= 0xff;
    let path = unique_temp_file("corrupt", &data);

    let output = eventstream(&["decode", path.to_str().unwrap(), "--format", "json"]);

    assert_eq!(output.status.code(), Some(60));
    assert_eq!(json_lines(&output).len(), 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("message checksum mismatch"), "stderr: {stderr}");
}

#[test]
fn decode_truncated_stream_exits_data_invalid() {
    let mut data = capture();
    data.truncate(data.len() - 5);
    let path = unique_temp_file("truncated", &data);

    let output = eventstream(&["decode", path.to_str().unwrap(), "--format", "json"]);

    assert_eq!(output.status.code(), Some(60));
    assert_eq!(json_lines(&output).len(), 2);
}

#[test]
fn decode_missing_file_exits_not_found() {
    let output = eventstream(&["decode", "/nonexistent/eventstream/capture.bin"]);
    assert_eq!(output.status.code(), Some(51));
}

#[test]
fn inspect_reports_frames() {
    let data = capture();
    let path = unique_temp_file("inspect", &data);
    let output = eventstream(&["inspect", path.to_str().unwrap(), "--format", "json"]);

    assert_eq!(output.status.code(), Some(0));
    let report = &json_lines(&output)[0];
    assert_eq!(report["bytes"], data.len());
    assert_eq!(report["frames"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["frames"][1]["event_type"], "Stats");
    assert!(report["error"].is_null());
}

#[test]
fn inspect_oversized_headers_exits_data_invalid() {
    let path = unique_temp_file("inspect-limits", &capture());
    let output = eventstream(&[
        "inspect",
        path.to_str().unwrap(),
        "--max-headers",
        "8",
        "--format",
        "json",
    ]);

    assert_eq!(output.status.code(), Some(60));
    let report = &json_lines(&output)[0];
    assert!(report["error"]
        .as_str()
        .is_some_and(|e| e.contains("illegal headers length")));
}

#[test]
fn version_prints_package_version() {
    let output = eventstream(&["version"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("eventstream {}", env!("CARGO_PKG_VERSION"))
    );
}
