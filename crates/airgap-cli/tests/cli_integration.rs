//! CLI subprocess integration tests.
//!
//! These tests invoke the `airgap` binary as a subprocess and verify exit
//! codes, stdout content, and JSON output stability. None of them reach a
//! real registry: every registry-bound run either fails validation first or
//! is pointed at an imgpkg binary that does not exist.

use airgap_schema::{Ledger, MANIFEST_FILE_NAME};
use std::path::Path;
use std::process::{Command, Output};

fn airgap_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_airgap"));
    // Keep the user's ~/.config/airgap/config.toml out of the picture.
    cmd.env("HOME", home);
    cmd.env_remove("AIRGAP_LOG");
    cmd
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn write_bundle(dir: &Path) -> Ledger {
    let mut ledger = Ledger::new();
    ledger.append("tkg-bom-v1.5.0.tar", "registry.local/tkg/tkg-bom");
    ledger.append("etcd-v3.5.0_vmware.1.tar", "registry.local/tkg/etcd");
    ledger.save(dir.join(MANIFEST_FILE_NAME)).unwrap();
    ledger
}

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success(), "airgap --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("airgap"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["export", "import", "plan", "inspect", "completions", "man-pages"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn cli_export_invalid_version_exits_2() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .args(["export", "--version", "1.5.0", "--dest-repo", "registry.local/tkg"])
        .arg("--output-dir")
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("invalid version tag '1.5.0'"));
    assert!(!out.path().join(MANIFEST_FILE_NAME).exists());
}

#[test]
fn cli_export_legacy_flags_are_accepted() {
    let home = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .args(["export", "--tkgVersion", "v1.5", "--customImageRepo", "registry.local/tkg"])
        .output()
        .unwrap();
    // parsed fine, rejected by version validation rather than by clap
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid version tag 'v1.5'"));
}

#[test]
fn cli_export_missing_dest_repo_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .args(["export", "--version", "v1.5.0"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--dest-repo"));
}

#[test]
fn cli_export_without_imgpkg_is_registry_error() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = write_config(
        home.path(),
        "imgpkg_bin = \"/nonexistent/airgap-test/imgpkg\"\n",
    );
    let output = airgap_bin(home.path())
        .arg("--config")
        .arg(&config)
        .args(["export", "--version", "v1.5.0", "--dest-repo", "registry.local/tkg"])
        .arg("--output-dir")
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("registry error:"));
    assert!(!out.path().join(MANIFEST_FILE_NAME).exists());
}

#[test]
fn cli_export_zero_timeout_is_interrupted() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .args(["export", "--version", "v1.5.0", "--dest-repo", "registry.local/tkg"])
        .args(["--timeout", "0"])
        .arg("--output-dir")
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(130), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("deadline exceeded"));
}

#[test]
fn cli_invalid_config_exits_2() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path(), "export_concurrency = 0\n");
    let output = airgap_bin(home.path())
        .arg("--config")
        .arg(&config)
        .args(["plan", "--version", "v1.5.0", "--dest-repo", "registry.local/tkg"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("invalid configuration"));
}

#[test]
fn cli_default_config_file_is_read() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".config/airgap");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "not_a_field = 1\n").unwrap();
    let output = airgap_bin(home.path())
        .args(["plan", "--version", "v1.5.0", "--dest-repo", "registry.local/tkg"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("config error:"));
}

#[test]
fn cli_import_missing_manifest_exits_3() {
    let home = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .arg("import")
        .arg("--bundle-dir")
        .arg(bundle.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("manifest not found"));
}

#[test]
fn cli_import_missing_archive_exits_3() {
    let home = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    write_bundle(bundle.path());
    let output = airgap_bin(home.path())
        .arg("import")
        .arg("--tkgTarFilePath")
        .arg(bundle.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("missing"));
}

#[test]
fn cli_import_missing_ca_cert_exits_2() {
    let home = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .arg("import")
        .arg("--bundle-dir")
        .arg(bundle.path())
        .arg("--ca-cert")
        .arg(bundle.path().join("ca.crt"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
}

#[test]
fn cli_inspect_json_output_stable() {
    let home = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    write_bundle(bundle.path());

    let output = airgap_bin(home.path())
        .args(["--json", "inspect", "--bundle-dir"])
        .arg(bundle.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let map = json.as_object().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["tkg-bom-v1.5.0.tar"], "registry.local/tkg/tkg-bom");
    assert_eq!(map["etcd-v3.5.0_vmware.1.tar"], "registry.local/tkg/etcd");
}

#[test]
fn cli_inspect_human_output() {
    let home = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    write_bundle(bundle.path());

    let output = airgap_bin(home.path())
        .args(["inspect", "--bundle-dir"])
        .arg(bundle.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("registry.local/tkg/etcd"));
    assert!(stdout.contains("2 archive(s)"));
}

#[test]
fn cli_inspect_corrupt_manifest_exits_3() {
    let home = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    std::fs::write(bundle.path().join(MANIFEST_FILE_NAME), "- not\n- a mapping\n").unwrap();
    let output = airgap_bin(home.path())
        .args(["inspect", "--bundle-dir"])
        .arg(bundle.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("manifest corrupt"));
}

#[test]
fn cli_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("airgap"));
}

#[test]
fn cli_man_pages_written() {
    let home = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let output = airgap_bin(home.path())
        .arg("man-pages")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("airgap.1").is_file());
    assert!(dir.path().join("airgap-export.1").is_file());
}
