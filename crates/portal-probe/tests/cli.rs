//! Exit codes and output of the `portal-probe` binary.

use std::path::Path;
use std::process::{Command, Output};

use rstest::rstest;
use tempfile::TempDir;

fn portal_probe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_portal-probe"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run portal-probe")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(dir: &Path, path: &str, content: &str) {
    let path = dir.join(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// a.txt names b.txt, which holds the marker line.
fn chain_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", "b.txt\n");
    write(dir.path(), "b.txt", "000\n");
    write(dir.path(), "release", "OpenWrt\nopenwrt\n");
    dir
}

#[rstest]
#[case::follow_reaches_marker(&["--marker", "000", "--follow", "a.txt"], 0, "matched\n")]
#[case::no_follow(&["--marker", "000", "a.txt"], 1, "no match\n")]
#[case::direct_hit(&["--marker", "000", "b.txt"], 0, "matched\n")]
#[case::glob_seed(&["--marker", "000", "*.txt"], 0, "matched\n")]
#[case::default_marker(&["release"], 0, "matched\n")]
#[case::marker_is_whole_line(&["--marker", "00", "--follow", "a.txt"], 1, "no match\n")]
#[case::missing_seed(&["--marker", "000", "absent.txt"], 1, "no match\n")]
#[case::after_double_dash(&["--marker", "000", "--", "b.txt"], 0, "matched\n")]
fn walk_exit_codes(#[case] args: &[&str], #[case] code: i32, #[case] out: &str) {
    let dir = chain_tree();
    let root = dir.path().to_str().unwrap();

    let mut full = vec!["walk", "--root", root];
    full.extend_from_slice(args);
    let output = portal_probe(&full);

    assert_eq!(output.status.code(), Some(code));
    assert_eq!(stdout(&output), out);
}

#[rstest]
#[case::bad_pattern(&["[]"])]
#[case::no_patterns(&[])]
#[case::unknown_option(&["--bogus", "a.txt"])]
#[case::marker_without_value(&["--marker"])]
fn walk_errors_exit_two(#[case] args: &[&str]) {
    let dir = chain_tree();
    let root = dir.path().to_str().unwrap();

    let mut full = vec!["walk", "--root", root];
    full.extend_from_slice(args);
    let output = portal_probe(&full);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn unknown_command_exits_two() {
    assert_eq!(portal_probe(&["frobnicate"]).status.code(), Some(2));
}

#[test]
fn help_and_version() {
    let help = portal_probe(&["--help"]);
    assert!(help.status.success());
    assert!(stdout(&help).contains("Usage:"));

    let version = portal_probe(&["--version"]);
    assert!(version.status.success());
    assert_eq!(
        stdout(&version),
        format!("portal-probe {}\n", env!("CARGO_PKG_VERSION"))
    );
}

/// Write a probe config rooted at `root`, plus any extra settings.
fn write_config(dir: &Path, root: &Path, extra: &str) -> String {
    let path = dir.join("probe.toml");
    std::fs::write(&path, format!("root = {:?}\n{extra}", root.to_str().unwrap())).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn os_detects_openwrt_root() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "etc/openwrt_release", "DISTRIB_ID='OpenWrt'\n");
    let config = write_config(root.path(), root.path(), "");

    let output = portal_probe(&["os", "--config", &config]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "openwrt: true\n");
}

#[test]
fn os_probe_error_reports_false() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "etc/os-release", &"x".repeat(100));
    let config = write_config(root.path(), root.path(), "max_file_size = 8\n");

    let output = portal_probe(&["os", "--config", &config]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "openwrt: false\n");
}

#[test]
fn os_missing_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let output = portal_probe(&["os", "--config", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}
