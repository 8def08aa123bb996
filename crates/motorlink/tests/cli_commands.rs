#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn missing_port() -> PathBuf {
    PathBuf::from(format!(
        "/tmp/motorlink-missing-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn motorlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_motorlink"));
    cmd.env_remove("MOTORLINK_PORT")
        .env_remove("MOTORLINK_BAUD")
        .arg("--log-level")
        .arg("error");
    cmd
}

#[test]
fn version_prints_package_version() {
    let output = motorlink()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("motorlink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_extended_lists_features() {
    let output = motorlink()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: motorlink"));
    assert!(stdout.contains("session=true"));
    assert!(stdout.contains("default_baud: 115200"));
}

#[test]
fn send_to_missing_port_fails_with_transport_error() {
    let port = missing_port();

    let output = motorlink()
        .arg("send")
        .arg(&port)
        .arg("pwm")
        .arg("55")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: open failed"));
    assert!(stderr.contains(&port.display().to_string()));
    assert!(output.stdout.is_empty());
}

#[test]
fn send_rejects_bad_mode_before_opening() {
    let output = motorlink()
        .arg("send")
        .arg(missing_port())
        .arg("mode")
        .arg("7")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mode must be 0 (manual) or 1 (automatic)"));
}

#[test]
fn monitor_missing_port_fails() {
    let output = motorlink()
        .arg("monitor")
        .arg(missing_port())
        .arg("--count")
        .arg("1")
        .output()
        .expect("monitor should run");

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn send_rejects_negative_gain_before_opening() {
    let output = motorlink()
        .arg("send")
        .arg(missing_port())
        .arg("kp")
        .arg("-3")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("KP gain must not be negative"));
}
