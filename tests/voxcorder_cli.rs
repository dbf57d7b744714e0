use std::env;
use std::fs;
use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxcorder_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxcorder").expect("voxcorder test binary not built")
}

fn voxcorder() -> Command {
    let mut command = Command::new(voxcorder_bin());
    command.env_remove("VOXCORDER_LOGS").env("VOXCORDER_NO_LOGS", "1");
    command
}

#[test]
fn voxcorder_help_mentions_name() {
    let output = voxcorder()
        .arg("--help")
        .output()
        .expect("run voxcorder --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Voxcorder"));
    assert!(combined.contains("--hangdelay"));
}

#[test]
fn voxcorder_listdevs_prints_test_devices() {
    let output = voxcorder()
        .arg("listdevs")
        .env("VOXCORDER_TEST_DEVICES", "default,USB Mic")
        .output()
        .expect("run voxcorder listdevs");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Device Information:"));
    assert!(stdout.contains("Dev#:  0 default"));
    assert!(stdout.contains("Dev#:  1 USB Mic"));
}

#[test]
fn voxcorder_listdevs_reports_no_devices() {
    let output = voxcorder()
        .arg("listdevs")
        .env("VOXCORDER_TEST_DEVICES", "")
        .output()
        .expect("run voxcorder listdevs");
    assert!(output.status.success());
    assert!(combined_output(&output).contains("No audio input devices detected."));
}

#[test]
fn voxcorder_requires_a_command() {
    let output = voxcorder().output().expect("run voxcorder");
    assert!(!output.status.success());
}

#[test]
fn voxcorder_rejects_out_of_range_threshold() {
    let output = voxcorder()
        .args(["record", "-t", "0"])
        .output()
        .expect("run voxcorder record -t 0");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--threshold must be between 1 and 99"));
}

#[test]
fn voxcorder_rejects_missing_output_dir() {
    let missing = env::temp_dir().join(format!("voxcorder_cli_missing_{}", std::process::id()));
    let _ = fs::remove_dir_all(&missing);
    let output = voxcorder()
        .arg("record")
        .arg("--output-dir")
        .arg(&missing)
        .output()
        .expect("run voxcorder record");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("does not exist"));
}
