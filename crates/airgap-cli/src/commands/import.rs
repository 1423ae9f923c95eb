use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use airgap_core::{CancelToken, Engine, ImportRequest};

pub fn run(
    engine: &Engine<'_>,
    request: &ImportRequest,
    cancel: &CancelToken,
    json: bool,
) -> Result<u8, String> {
    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "publishing archives from {}...",
            request.bundle_dir.display()
        )))
    };

    let report = match engine.import(request, cancel) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "import finished");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "import failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!("pushed {} image(s)", report.images_pushed);
    }
    Ok(EXIT_SUCCESS)
}
