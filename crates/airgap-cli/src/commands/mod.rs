pub mod completions;
pub mod export;
pub mod import;
pub mod inspect;
pub mod man_pages;
pub mod plan;

use airgap_core::{BundleConfig, WorkKind};
use airgap_registry::ImgpkgClient;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INVALID_INPUT: u8 = 2;
pub const EXIT_MANIFEST_ERROR: u8 = 3;
pub const EXIT_REGISTRY_ERROR: u8 = 4;
pub const EXIT_CANCELLED: u8 = 130;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_kind(kind: WorkKind) -> String {
    use console::Style;
    let label = kind.to_string();
    match kind {
        WorkKind::PlatformCompatibility | WorkKind::ReleaseCompatibility => {
            Style::new().blue().apply_to(label).to_string()
        }
        WorkKind::PlatformBom => Style::new().cyan().bold().apply_to(label).to_string(),
        WorkKind::ReleaseBom => Style::new().cyan().apply_to(label).to_string(),
        WorkKind::Component => Style::new().dim().apply_to(label).to_string(),
    }
}

pub fn make_client(config: &BundleConfig) -> ImgpkgClient {
    ImgpkgClient::new(&config.imgpkg_bin)
}
