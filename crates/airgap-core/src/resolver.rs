//! Platform → release compatibility walk.
//!
//! Resolution pulls the platform BOM, the release compatibility document and
//! every compatible release BOM into scratch directories, then flattens their
//! images into [`WorkItem`]s. Nothing is copied to archives here.

use crate::bundle::{Bundle, Roots, WorkItem, WorkKind};
use crate::tags::select_latest_tag;
use crate::CoreError;
use airgap_registry::{CancelToken, RegistryClient};
use airgap_schema::{underscored_plus, Bom, CompatibilityMetadata, ImageRef, SchemaError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

pub const PLATFORM_COMPATIBILITY_REPO: &str = "tkg-compatibility";
pub const PLATFORM_BOM_REPO: &str = "tkg-bom";
pub const RELEASE_COMPATIBILITY_REPO: &str = "tkr-compatibility";
pub const RELEASE_BOM_REPO: &str = "tkr-bom";

/// Release versions listed for `platform_version`. The first matching entry wins.
pub fn resolve_release_versions(
    doc: &CompatibilityMetadata,
    platform_version: &str,
) -> Result<Vec<String>, CoreError> {
    doc.release_versions_for(platform_version)
        .map(<[String]>::to_vec)
        .ok_or_else(|| CoreError::IncompatiblePlatformVersion(platform_version.to_owned()))
}

/// One resolution run. Owns the scratch directory every pulled document lands
/// in; it is removed when the resolver is dropped, whatever the outcome.
pub struct Resolver<'a> {
    client: &'a dyn RegistryClient,
    roots: Roots,
    scratch: TempDir,
    pulls: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(
        client: &'a dyn RegistryClient,
        source_repo: &str,
        dest_repo: &str,
    ) -> Result<Self, CoreError> {
        Self::with_scratch(client, source_repo, dest_repo, tempfile::tempdir()?)
    }

    /// Place the scratch directory under `parent` instead of the system temp dir.
    pub fn new_in(
        client: &'a dyn RegistryClient,
        source_repo: &str,
        dest_repo: &str,
        parent: &Path,
    ) -> Result<Self, CoreError> {
        fs::create_dir_all(parent)?;
        let scratch = tempfile::Builder::new()
            .prefix("airgap-scratch-")
            .tempdir_in(parent)?;
        Self::with_scratch(client, source_repo, dest_repo, scratch)
    }

    fn with_scratch(
        client: &'a dyn RegistryClient,
        source_repo: &str,
        dest_repo: &str,
        scratch: TempDir,
    ) -> Result<Self, CoreError> {
        debug!("resolver scratch directory: {}", scratch.path().display());
        Ok(Self {
            client,
            roots: Roots::new(source_repo, dest_repo),
            scratch,
            pulls: 0,
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Walk the whole compatibility graph for `platform_version`.
    ///
    /// Items come out in a fixed order: platform compatibility image,
    /// platform BOM and its images, release compatibility image, then each
    /// release BOM followed by its images. Repeated images are kept.
    pub fn resolve_bundle(
        mut self,
        platform_version: &str,
        cancel: &CancelToken,
    ) -> Result<Bundle, CoreError> {
        info!("resolving bundle for {platform_version}");
        let mut items = Vec::new();

        cancel.check()?;
        let compat_repo = self.roots.source.join(PLATFORM_COMPATIBILITY_REPO);
        let compat_tag = select_latest_tag(self.client, &compat_repo, cancel)?;
        items.push(self.roots.item(
            PLATFORM_COMPATIBILITY_REPO,
            &compat_tag,
            WorkKind::PlatformCompatibility,
        ));

        cancel.check()?;
        let platform_bom = self
            .roots
            .item(PLATFORM_BOM_REPO, platform_version, WorkKind::PlatformBom);
        let bom = self.read_bom(
            &platform_bom.source,
            &format!("{PLATFORM_BOM_REPO}-{platform_version}.yaml"),
            cancel,
        )?;
        items.push(platform_bom);
        self.push_images(&bom, &mut items);

        cancel.check()?;
        let (release_compat, doc) = self.release_compatibility(cancel)?;
        let release_versions = resolve_release_versions(&doc, platform_version)?;
        info!(
            "{platform_version} supports {} release(s): {}",
            release_versions.len(),
            release_versions.join(", ")
        );
        items.push(release_compat);

        for version in &release_versions {
            cancel.check()?;
            let tag = underscored_plus(version);
            let release_bom = self.roots.item(RELEASE_BOM_REPO, &tag, WorkKind::ReleaseBom);
            let bom = self.read_bom(
                &release_bom.source,
                &format!("{RELEASE_BOM_REPO}-{version}.yaml"),
                cancel,
            )?;
            items.push(release_bom);
            self.push_images(&bom, &mut items);
        }

        debug!("resolved {} work item(s)", items.len());
        Ok(Bundle {
            platform_version: platform_version.to_owned(),
            release_versions,
            items,
        })
    }

    fn release_compatibility(
        &mut self,
        cancel: &CancelToken,
    ) -> Result<(WorkItem, CompatibilityMetadata), CoreError> {
        let repo = self.roots.source.join(RELEASE_COMPATIBILITY_REPO);
        let tag = select_latest_tag(self.client, &repo, cancel)?;
        let item = self
            .roots
            .item(RELEASE_COMPATIBILITY_REPO, &tag, WorkKind::ReleaseCompatibility);
        let dir = self.pull(&item.source, cancel)?;
        let file = single_file(&dir).map_err(CoreError::document(format!(
            "compatibility image {}",
            item.source
        )))?;
        let content = read_document(&file, format!("compatibility image {}", item.source))?;
        let doc = CompatibilityMetadata::from_yaml(&content)
            .map_err(CoreError::document(format!("compatibility document {}", file.display())))?;
        Ok((item, doc))
    }

    fn read_bom(
        &mut self,
        image: &ImageRef,
        file_name: &str,
        cancel: &CancelToken,
    ) -> Result<Bom, CoreError> {
        let dir = self.pull(image, cancel)?;
        let content = read_document(&dir.join(file_name), format!("BOM image {image}"))?;
        Bom::from_yaml(&content).map_err(CoreError::document(format!("BOM {image}")))
    }

    /// Pull `image` into a fresh directory under the scratch root.
    fn pull(&mut self, image: &ImageRef, cancel: &CancelToken) -> Result<PathBuf, CoreError> {
        self.pulls += 1;
        let dir = self.scratch.path().join(format!("pull-{}", self.pulls));
        fs::create_dir_all(&dir)?;
        debug!("pulling {image} into {}", dir.display());
        self.client
            .pull_to_directory(image, &dir, cancel)
            .map_err(CoreError::registry(format!("pull {image}")))?;
        Ok(dir)
    }

    fn push_images(&self, bom: &Bom, items: &mut Vec<WorkItem>) {
        items.extend(
            bom.images()
                .map(|image| self.roots.item(&image.image_path, &image.tag, WorkKind::Component)),
        );
    }
}

/// Read a pulled document, naming the image it came from on failure.
fn read_document(path: &Path, context: String) -> Result<Vec<u8>, CoreError> {
    fs::read(path).map_err(|e| {
        let detail = match path.file_name() {
            Some(name) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("{} not found in image", name.to_string_lossy())
            }
            _ => format!("cannot read {}: {e}", path.display()),
        };
        CoreError::Document {
            context,
            source: SchemaError::MalformedDocument(detail),
        }
    })
}

/// The only entry of `dir`, which must be a regular file.
fn single_file(dir: &Path) -> Result<PathBuf, SchemaError> {
    let entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| SchemaError::MalformedDocument(format!("cannot read {}: {e}", dir.display())))?
        .flatten()
        .collect();
    match entries.as_slice() {
        [entry] if entry.file_type().is_ok_and(|t| t.is_file()) => Ok(entry.path()),
        [_] => Err(SchemaError::MalformedDocument(
            "expected exactly one regular file, found a directory".to_owned(),
        )),
        _ => Err(SchemaError::MalformedDocument(format!(
            "expected exactly one file, found {}",
            entries.len()
        ))),
    }
}
