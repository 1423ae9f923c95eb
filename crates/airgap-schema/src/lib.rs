//! Document schema and persisted state for airgap image bundles.
//!
//! This crate defines the data layer: image references (`ImageRef`), the
//! platform and release bill-of-materials (`Bom`), the release compatibility
//! document (`CompatibilityMetadata`), `v<major>.<minor>.<patch>` tag parsing,
//! and the `Ledger` that maps archive names to destination repositories and
//! bridges the export and import phases.

pub mod bom;
pub mod compatibility;
pub mod ledger;
pub mod ordered;
pub mod types;
pub mod version;

pub use bom::{Bom, ComponentInfo, ImageConfig, ImageInfo, ReleaseInfo};
pub use compatibility::{CompatibilityEntry, CompatibilityMetadata};
pub use ledger::{Ledger, LedgerError, MANIFEST_FILE_NAME};
pub use ordered::OrderedMap;
pub use types::{ArchiveName, ImageRef, RepoPath};
pub use version::{is_valid_version_tag, parse_version_tag, underscored_plus, VersionTriplet};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("invalid image reference '{0}'")]
    InvalidImageRef(String),
}

impl SchemaError {
    pub(crate) fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedDocument(reason.to_string())
    }
}
