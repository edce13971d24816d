use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn run_binary(dir: &Path, args: &[&str], creds: bool) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_zwiftpower_scraper"));
    cmd.current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("ZWIFT_USER")
        .env_remove("ZWIFT_PASS")
        .env_remove("ZP_COOKIE_FILE")
        .env_remove("ZP_COOKIE_EXPIRY_HOURS")
        .env_remove("ZP_REQUEST_DELAY_SECS")
        .env_remove("ZP_HTTP_TIMEOUT_SECS");
    if creds {
        cmd.env("ZWIFT_USER", "rider@example.com").env("ZWIFT_PASS", "s3cret");
    }
    cmd.output().unwrap()
}

#[test]
fn missing_credentials_fail_once_with_nonzero_status() {
    let dir = tempdir().unwrap();
    let output = run_binary(dir.path(), &[], false);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("ZWIFT_USER is not set").count(), 1, "{}", stderr);
}

#[test]
fn header_only_input_writes_header_only_output() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("riders.csv"), "Name,ZwiftID\n").unwrap();

    let output = run_binary(dir.path(), &["riders.csv", "out.csv"], true);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let written = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert_eq!(written, "Name,ZwiftID,Category,Races,zFTP,ZwiftRacingScore\n");
    // No session was needed, so no cache was written.
    assert!(!dir.path().join("cookies.json").exists());
}
