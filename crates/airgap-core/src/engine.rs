use crate::bundle::Bundle;
use crate::config::BundleConfig;
use crate::resolver::Resolver;
use crate::CoreError;
use airgap_registry::{CancelToken, RegistryClient};
use airgap_schema::{is_valid_version_tag, Ledger, LedgerError, RepoPath, MANIFEST_FILE_NAME};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Drives resolution and both transfer phases against one registry client.
///
/// The engine holds no state between calls: each export builds its own
/// ledger and each import reads the one it is pointed at.
pub struct Engine<'a> {
    client: &'a dyn RegistryClient,
    config: BundleConfig,
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub platform_version: String,
    pub source_repo: String,
    pub dest_repo: String,
    pub output_dir: PathBuf,
    /// Resolve only; copy nothing and write no manifest.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub bundle: Bundle,
    pub images_copied: usize,
    /// Distinct archive names recorded in the manifest.
    pub archive_count: usize,
    pub manifest_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub bundle_dir: PathBuf,
    pub ca_cert: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub images_pushed: usize,
    pub manifest_path: PathBuf,
}

impl<'a> Engine<'a> {
    pub fn new(client: &'a dyn RegistryClient, config: BundleConfig) -> Self {
        Self { client, config }
    }

    /// Resolve the bundle for `request` without transferring anything.
    pub fn plan(&self, request: &ExportRequest, cancel: &CancelToken) -> Result<Bundle, CoreError> {
        validate_export(request)?;
        let resolver = match &self.config.scratch_dir {
            Some(parent) => Resolver::new_in(
                self.client,
                &request.source_repo,
                &request.dest_repo,
                parent,
            )?,
            None => Resolver::new(self.client, &request.source_repo, &request.dest_repo)?,
        };
        resolver.resolve_bundle(&request.platform_version, cancel)
    }

    /// Copy every resolved image into `output_dir` and write the manifest.
    ///
    /// The manifest is written once, after the last copy succeeds. Any
    /// failure leaves the directory without a (new) manifest.
    pub fn export(
        &self,
        request: &ExportRequest,
        cancel: &CancelToken,
    ) -> Result<ExportReport, CoreError> {
        let bundle = self.plan(request, cancel)?;
        if request.dry_run {
            info!("dry run: {} image(s) resolved, nothing copied", bundle.len());
            return Ok(ExportReport {
                images_copied: 0,
                archive_count: 0,
                manifest_path: None,
                bundle,
            });
        }

        std::fs::create_dir_all(&request.output_dir)?;
        let mut ledger = Ledger::new();
        let mut copied = 0;
        for item in &bundle.items {
            cancel.check()?;
            let archive = request.output_dir.join(item.archive_name.as_str());
            debug!("copying {} -> {}", item.source, archive.display());
            self.client
                .copy_image_to_archive(
                    &item.source,
                    &archive,
                    self.config.export_concurrency,
                    cancel,
                )
                .map_err(CoreError::transfer(item.source.to_string()))?;
            if let Some(previous) = ledger.append(item.archive_name.as_str(), item.destination.as_str())
            {
                if previous != item.destination.as_str() {
                    warn!(
                        "{} now maps to {} (was {previous})",
                        item.archive_name, item.destination
                    );
                }
            }
            copied += 1;
        }

        let manifest_path = request.output_dir.join(MANIFEST_FILE_NAME);
        ledger.save(&manifest_path)?;
        info!(
            "copied {copied} image(s) into {} archive(s), manifest {}",
            ledger.len(),
            manifest_path.display()
        );
        Ok(ExportReport {
            images_copied: copied,
            archive_count: ledger.len(),
            manifest_path: Some(manifest_path),
            bundle,
        })
    }

    /// Replay every archive listed in the bundle manifest into its destination.
    ///
    /// All archives are checked for presence before the first push.
    pub fn import(
        &self,
        request: &ImportRequest,
        cancel: &CancelToken,
    ) -> Result<ImportReport, CoreError> {
        if let Some(cert) = &request.ca_cert {
            if !cert.is_file() {
                return Err(CoreError::InvalidConfiguration(format!(
                    "CA certificate {} does not exist",
                    cert.display()
                )));
            }
        }

        let (manifest_path, ledger) = load_manifest(&request.bundle_dir)?;
        let mut archives: Vec<(PathBuf, RepoPath)> = Vec::with_capacity(ledger.len());
        for (name, destination) in ledger.iter() {
            let path = request.bundle_dir.join(name);
            if !path.is_file() {
                return Err(CoreError::MissingArchive(path));
            }
            archives.push((path, destination.into()));
        }
        info!(
            "importing {} archive(s) from {}",
            archives.len(),
            request.bundle_dir.display()
        );

        let mut pushed = 0;
        for (archive, destination) in &archives {
            cancel.check()?;
            debug!("pushing {} -> {destination}", archive.display());
            self.client
                .copy_archive_to_registry(
                    archive,
                    destination,
                    request.ca_cert.as_deref(),
                    self.config.import_concurrency,
                    cancel,
                )
                .map_err(CoreError::transfer(archive.display().to_string()))?;
            pushed += 1;
        }

        info!("pushed {pushed} image(s)");
        Ok(ImportReport {
            images_pushed: pushed,
            manifest_path,
        })
    }

    /// Read the manifest of a bundle directory.
    pub fn inspect(bundle_dir: &Path) -> Result<Ledger, CoreError> {
        load_manifest(bundle_dir).map(|(_, ledger)| ledger)
    }
}

fn validate_export(request: &ExportRequest) -> Result<(), CoreError> {
    if !is_valid_version_tag(&request.platform_version) {
        return Err(CoreError::InvalidVersionTag(request.platform_version.clone()));
    }
    if request.source_repo.trim_end_matches('/').is_empty() {
        return Err(CoreError::InvalidConfiguration(
            "source repository must not be empty".to_owned(),
        ));
    }
    if request.dest_repo.trim_end_matches('/').is_empty() {
        return Err(CoreError::InvalidConfiguration(
            "destination repository must not be empty".to_owned(),
        ));
    }
    Ok(())
}

/// Load `<bundle_dir>/publish-images-fromtar.yaml` and reject entries that
/// would escape the bundle directory or have no destination.
fn load_manifest(bundle_dir: &Path) -> Result<(PathBuf, Ledger), CoreError> {
    let path = bundle_dir.join(MANIFEST_FILE_NAME);
    let ledger = Ledger::load(&path)?;
    for (name, destination) in ledger.iter() {
        let escapes = name.contains('/') || name.contains('\\') || name.contains("..");
        let reason = if name.is_empty() || escapes {
            format!("archive name '{name}' is not a plain file name")
        } else if destination.trim_matches('/').is_empty() {
            format!("archive '{name}' has no destination")
        } else {
            continue;
        };
        return Err(LedgerError::Corrupt { path, reason }.into());
    }
    Ok((path, ledger))
}
