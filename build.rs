use chrono::{DateTime, Utc};
use std::process::Command;

fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let git_commit = git(&["rev-parse", "--short", "HEAD"]);

    let now: DateTime<Utc> = Utc::now();
    let build_date = now.to_rfc3339();

    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    println!(
        "cargo:rustc-env=JACKC_LONG_VERSION={} ({} {})",
        version, git_commit, build_date
    );
}
