use super::{colorize_kind, json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use airgap_core::{CancelToken, Engine, ExportRequest, WorkKind};

pub fn run(
    engine: &Engine<'_>,
    request: &ExportRequest,
    cancel: &CancelToken,
    json: bool,
) -> Result<u8, String> {
    let pb = if json {
        None
    } else {
        Some(spinner(&format!("resolving {}...", request.platform_version)))
    };

    let bundle = match engine.plan(request, cancel) {
        Ok(b) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "resolved");
            }
            b
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "resolution failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&bundle)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("platform: {}", bundle.platform_version);
    println!("releases: {}", bundle.release_versions.join(", "));
    for item in &bundle.items {
        println!(
            "  {:<24} {} -> {}",
            colorize_kind(item.kind),
            item.source,
            item.destination
        );
    }
    println!(
        "{} image(s), {} component image(s)",
        bundle.len(),
        bundle.count(WorkKind::Component)
    );
    Ok(EXIT_SUCCESS)
}
