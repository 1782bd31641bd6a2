use std::fs;
use std::process::Command;

use tempfile::TempDir;

const CONFIG: &str = r#"
[window]
title = "bench"

[source]
fps = 12
width = 320
height = 240

[render]
clear_color = [0.0, 0.0, 0.25, 1.0]
"#;

fn edgecam() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_edgecam"));
    command.env_remove("EDGECAM_CONFIG").env("RUST_LOG", "off");
    command
}

#[test]
fn config_subcommand_merges_file_and_flags() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("edgecam.toml");
    fs::write(&path, CONFIG).unwrap();

    let output = edgecam()
        .arg("--config")
        .arg(&path)
        .args(["--vsync", "off", "--frame-size", "64x48", "config"])
        .output()
        .expect("failed to run edgecam config");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("title = \"bench\""));
    assert!(stdout.contains("fps = 12.0"));
    assert!(stdout.contains("width = 64\n"));
    assert!(stdout.contains("height = 48\n"));
    assert!(stdout.contains("vsync = false"));
}

#[test]
fn config_path_is_read_from_the_environment() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("edgecam.toml");
    fs::write(&path, CONFIG).unwrap();

    let output = edgecam()
        .env("EDGECAM_CONFIG", &path)
        .arg("config")
        .output()
        .expect("failed to run edgecam config");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("title = \"bench\""));
}

#[test]
fn invalid_configuration_fails() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("edgecam.toml");
    fs::write(&path, "[source]\nfps = -1\n").unwrap();

    let status = edgecam()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .status()
        .expect("failed to run edgecam config");
    assert!(!status.success());

    let status = edgecam()
        .args(["--clear-color", "2,0,0", "config"])
        .status()
        .expect("failed to run edgecam config");
    assert!(!status.success());
}

#[test]
fn missing_configuration_file_fails() {
    let root = TempDir::new().unwrap();
    let status = edgecam()
        .arg("--config")
        .arg(root.path().join("absent.toml"))
        .arg("config")
        .status()
        .expect("failed to run edgecam config");
    assert!(!status.success());
}
