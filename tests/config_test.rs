//! Settings file and command-line tests.
//! Run with: cargo test --test config_test

use std::process::Command;

use chat_simulator::{ConfigError, Settings};
use tempfile::TempDir;

/// Run the binary with a clean `CHAT_SIMULATOR_*` environment.
fn chat_simulator(args: &[&str]) -> std::process::Output {
    chat_simulator_with_env(args, &[])
}

/// Run the binary with only the given `CHAT_SIMULATOR_*` variables set.
fn chat_simulator_with_env(args: &[&str], env: &[(&str, &str)]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chat-simulator"));
    for key in [
        "USERNAME",
        "OAUTH_TOKEN",
        "CHANNEL",
        "MESSAGES_PER_GENERATION",
        "DEBUG",
        "SERVER_HOST",
        "SERVER_PORT",
    ] {
        cmd.env_remove(format!("CHAT_SIMULATOR_{key}"));
    }
    for (key, value) in env {
        cmd.env(format!("CHAT_SIMULATOR_{key}"), value);
    }
    cmd.args(args).output().expect("Failed to execute chat-simulator")
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from_file(&temp_dir.path().join("absent.json")).unwrap();
    assert_eq!(settings.messages_per_generation, 200);
    assert!(settings.username.is_empty());
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(Settings::load_from_file(&path).is_err());
}

#[test]
fn test_save_then_load_keeps_everything_but_token() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let settings = Settings {
        username: "bot".to_string(),
        oauth_token: "oauth:secret".to_string(),
        channel: "chan".to_string(),
        messages_per_generation: 50,
        ..Settings::default()
    };
    settings.save(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("secret"));

    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded.username, "bot");
    assert_eq!(loaded.messages_per_generation, 50);
    assert!(loaded.oauth_token.is_empty());
    assert_eq!(loaded.validate().unwrap_err(), ConfigError::MissingToken);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_config_command_prints_settings_without_token() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"username": "bot", "oauth_token": "oauth:hidden", "channel": "chan"}"#,
    )
    .unwrap();

    let output = chat_simulator(&["--config", path.to_str().unwrap(), "config"]);
    assert!(output.status.success(), "Command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"username\": \"bot\""));
    assert!(!stdout.contains("hidden"));
}

#[test]
fn test_start_rejects_threshold_of_one_before_connecting() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"username": "bot", "oauth_token": "abcd1234", "channel": "chan", "server_host": "127.0.0.1", "server_port": 1}"#,
    )
    .unwrap();

    let output = chat_simulator(&[
        "--config",
        path.to_str().unwrap(),
        "start",
        "--messages-per-generation",
        "1",
    ]);
    assert!(!output.status.success(), "Start should fail fast");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("messages_per_generation must be at least 2"), "{stderr}");
}

#[test]
fn test_start_rejects_malformed_threshold_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"username": "bot", "oauth_token": "abcd1234", "channel": "chan", "server_host": "127.0.0.1", "server_port": 1}"#,
    )
    .unwrap();

    let output = chat_simulator_with_env(
        &["--config", path.to_str().unwrap(), "start"],
        &[("MESSAGES_PER_GENERATION", "1O")],
    );
    assert!(!output.status.success(), "Start should fail fast");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("CHAT_SIMULATOR_MESSAGES_PER_GENERATION=\"1O\" is not a valid number"),
        "{stderr}"
    );
}
