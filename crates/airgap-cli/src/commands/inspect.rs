use super::{json_pretty, EXIT_SUCCESS};
use airgap_core::Engine;
use std::path::Path;

pub fn run(bundle_dir: &Path, json: bool) -> Result<u8, String> {
    let ledger = Engine::inspect(bundle_dir).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&ledger)?);
        return Ok(EXIT_SUCCESS);
    }
    if ledger.is_empty() {
        println!("bundle {} lists no archives", bundle_dir.display());
        return Ok(EXIT_SUCCESS);
    }
    let width = ledger.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (archive, destination) in ledger.iter() {
        println!("{archive:<width$}  {destination}");
    }
    println!("{} archive(s)", ledger.len());
    Ok(EXIT_SUCCESS)
}
