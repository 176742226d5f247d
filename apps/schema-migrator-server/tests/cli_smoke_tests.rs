#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the schema-migrator-server binary.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

const KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

fn run_server(args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_schema-migrator-server"))
        .args(args)
        .envs(envs.iter().copied())
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute schema-migrator-server")
}

fn write_config(dir: &Path, bind_addr: &str, key: &str) -> String {
    let home = dir.join("home");
    let yaml = format!(
        concat!(
            "server:\n",
            "  bind_addr: \"{}\"\n",
            "  home_dir: \"{}\"\n",
            "logging:\n",
            "  level: warn\n",
            "schema_migrator:\n",
            "  encryption_key: \"{}\"\n",
            "  tokens:\n",
            "    smoke-token:\n",
            "      tenant_id: 6f1c1c2e-8a4b-4c43-9f0e-1b9f1f6b2a10\n",
        ),
        bind_addr,
        home.display(),
        key,
    );
    let path = dir.join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_cli_help_command() {
    let output = run_server(&["--help"], &[]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("schema-migrator-server"), "{stdout}");
    assert!(stdout.contains("Usage:"), "{stdout}");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--print-config"));
}

#[test]
fn test_cli_version_command() {
    let output = run_server(&["--version"], &[]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("schema-migrator-server"), "{stdout}");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "{stdout}");
}

#[test]
fn test_cli_invalid_command() {
    let output = run_server(&["migrate-everything"], &[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"), "{stderr}");
}

#[test]
fn test_cli_missing_config_file() {
    let output = run_server(&["--config", "/definitely/not/here.yaml", "check"], &[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file does not exist"), "{stderr}");
}

#[test]
fn test_cli_check_accepts_valid_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "127.0.0.1:8087", KEY);

    let output = run_server(&["--config", &config, "check"], &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));
}

#[test]
fn test_cli_check_rejects_bad_key() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "127.0.0.1:8087", "c2hvcnQ=");

    let output = run_server(&["--config", &config, "check"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("encryption_key"), "{stderr}");
}

#[test]
fn test_cli_check_rejects_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "server:\n  listen: 1\n").unwrap();

    let output = run_server(&["--config", path.to_str().unwrap(), "check"], &[]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_env_overrides_yaml() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "127.0.0.1:8087", "c2hvcnQ=");

    let output = run_server(
        &["--config", &config, "check"],
        &[("APP__SCHEMA_MIGRATOR__ENCRYPTION_KEY", KEY)],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
}

#[test]
fn test_cli_print_config_is_parseable_and_redacted() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "127.0.0.1:8087", KEY);

    let output = run_server(&["--config", &config, "--port", "9911", "--print-config"], &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains(KEY), "{stdout}");
    assert!(!stdout.contains("smoke-token"), "{stdout}");

    let parsed: serde_json::Value = serde_saphyr::from_str(&stdout).unwrap();
    assert_eq!(parsed["server"]["bind_addr"], "127.0.0.1:9911");
    assert_eq!(parsed["database"]["engine"], "sqlite");
}

async fn get(addr: &str, path: &str) -> std::io::Result<String> {
    let mut stream = tokio::net::TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

#[tokio::test]
async fn test_cli_run_serves_health() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let addr = format!("127.0.0.1:{port}");
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &addr, KEY);

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_schema-migrator-server"))
        .args(["--config", &config, "run"])
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    let mut health = None;
    for _ in 0..100 {
        if let Ok(resp) = get(&addr, "/health").await {
            health = Some(resp);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let health = health.expect("server did not come up");
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.to_ascii_lowercase().contains("x-request-id"), "{health}");

    let denied = get(&addr, "/schema-migrator/v1/does-not-matter").await.unwrap();
    assert!(denied.starts_with("HTTP/1.1 404"), "{denied}");

    assert!(dir.path().join("home/schema_migrator.db").exists());

    child.kill().await.unwrap();
}
