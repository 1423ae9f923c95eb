use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use airgap_core::{CancelToken, Engine, ExportRequest};

pub fn run(
    engine: &Engine<'_>,
    request: &ExportRequest,
    cancel: &CancelToken,
    json: bool,
) -> Result<u8, String> {
    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "exporting {} from {}...",
            request.platform_version, request.source_repo
        )))
    };

    let report = match engine.export(request, cancel) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "export finished");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "export failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }
    println!(
        "platform {} with {} release(s): {}",
        report.bundle.platform_version,
        report.bundle.release_versions.len(),
        report.bundle.release_versions.join(", ")
    );
    match &report.manifest_path {
        Some(path) => {
            println!(
                "copied {} image(s) into {} archive(s)",
                report.images_copied, report.archive_count
            );
            println!("manifest: {}", path.display());
        }
        None => println!("dry run: {} image(s) resolved, nothing copied", report.bundle.len()),
    }
    Ok(EXIT_SUCCESS)
}
