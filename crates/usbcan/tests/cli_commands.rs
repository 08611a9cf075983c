#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn usbcan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_usbcan"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("USBCAN_DEVICE")
        .env_remove("USBCAN_LOG_LEVEL")
        .output()
        .expect("usbcan should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn pack_emits_little_endian_bytes() {
    let output = usbcan(&[
        "--format", "json", "pack", "--types", "u24,f32", "--values", "0x123456,1",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["data"], "56 34 12 00 00 80 3f");
    assert_eq!(json["len"], 7);
    assert_eq!(json["types"], serde_json::json!(["u24", "f32"]));
    assert!(json.get("dlc_index").is_none());
}

#[test]
fn pack_with_pad_rounds_to_dlc() {
    let output = usbcan(&[
        "--format",
        "json",
        "pack",
        "--types",
        "u16,u24,u24,i16",
        "--values",
        "40960,100000,200000,-5",
        "--pad",
    ]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["len"], 12);
    assert_eq!(json["dlc_index"], 9);
}

#[test]
fn pack_out_of_range_is_data_invalid() {
    let output = usbcan(&["pack", "--types", "u8", "--values", "300"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn unpack_prints_typed_fields() {
    let output = usbcan(&[
        "--format", "json", "unpack", "--types", "u16,i8", "--hex", "34 12 ff 00 00",
    ]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json[0]["type"], "u16");
    assert_eq!(json[0]["value"], 0x1234);
    assert_eq!(json[1]["type"], "i8");
    assert_eq!(json[1]["value"], -1);
}

#[test]
fn unpack_truncated_payload_is_data_invalid() {
    let output = usbcan(&["unpack", "--types", "u32", "--hex", "0102"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn unpack_bad_hex_is_usage_error() {
    let output = usbcan(&["unpack", "--types", "u8", "--hex", "abc"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn pretty_format_prints_bare_values() {
    let output = usbcan(&["--format", "pretty", "unpack", "--types", "f32", "--hex", "0000c03f"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "1.5");
}

#[test]
fn send_to_missing_device_is_transport_error() {
    let output = usbcan(&[
        "send",
        "13",
        "--data",
        "0102030610",
        "--device",
        "usbcan-test-adapter-that-does-not-exist",
    ]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn send_validates_payload_before_opening_device() {
    let output = usbcan(&[
        "send",
        "1",
        "--data",
        "0102",
        "--dlc",
        "3",
        "--device",
        "usbcan-test-adapter-that-does-not-exist",
    ]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn version_prints_package_version() {
    let output = usbcan(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("usbcan {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_extended_lists_features() {
    let output = usbcan(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: usbcan"));
    assert!(stdout.contains("serial=true"));
}
