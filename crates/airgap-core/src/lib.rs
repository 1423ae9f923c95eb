//! Bundle resolution and transfer orchestration for air-gapped deployments.
//!
//! This crate walks the platform BOM → release compatibility → release BOM
//! graph into an ordered [`Bundle`] of work items (`Resolver`), copies every
//! item into a tar archive while recording it in the manifest ledger
//! (`Engine::export`), and replays a bundle directory into a private registry
//! (`Engine::import`). Registry access goes through the injected
//! `RegistryClient`; every step honours a `CancelToken`.

pub mod bundle;
pub mod concurrency;
pub mod config;
pub mod engine;
pub mod resolver;
pub mod tags;

pub use airgap_registry::{CancelToken, Interrupted};
pub use bundle::{archive_name, Bundle, WorkItem, WorkKind};
pub use concurrency::install_signal_handler;
pub use config::BundleConfig;
pub use engine::{Engine, ExportReport, ExportRequest, ImportReport, ImportRequest};
pub use resolver::{resolve_release_versions, Resolver};
pub use tags::{latest_tag, select_latest_tag};

use airgap_registry::RegistryError;
use airgap_schema::{LedgerError, SchemaError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid version tag '{0}': expected v<major>.<minor>.<patch>")]
    InvalidVersionTag(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("no tags found for {0}")]
    NoTagsFound(String),
    #[error("invalid tag format '{tag}' in {repository}: expected v<major>.<minor>.<patch>")]
    InvalidTagFormat { repository: String, tag: String },
    #[error("platform version {0} is not listed in the release compatibility document")]
    IncompatiblePlatformVersion(String),
    #[error("{context}: {source}")]
    Document {
        context: String,
        source: SchemaError,
    },
    #[error("manifest error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("manifest error: archive {} listed in the manifest is missing", .0.display())]
    MissingArchive(PathBuf),
    #[error("registry error: {context}: {source}")]
    Registry {
        context: String,
        source: RegistryError,
    },
    #[error("registry error: transfer of {image} failed: {source}")]
    Transfer {
        image: String,
        source: RegistryError,
    },
    #[error("interrupted: {0}")]
    Interrupted(#[from] Interrupted),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Wrap a registry failure with the step it happened in. An interrupted
    /// call surfaces as [`CoreError::Interrupted`] rather than a registry error.
    pub(crate) fn registry(context: impl Into<String>) -> impl FnOnce(RegistryError) -> Self {
        let context = context.into();
        move |source| match source {
            RegistryError::Interrupted(i) => Self::Interrupted(i),
            source => Self::Registry { context, source },
        }
    }

    /// Like [`registry`](Self::registry), for a failed archive copy or push.
    pub(crate) fn transfer(image: impl Into<String>) -> impl FnOnce(RegistryError) -> Self {
        let image = image.into();
        move |source| match source {
            RegistryError::Interrupted(i) => Self::Interrupted(i),
            source => Self::Transfer { image, source },
        }
    }

    pub(crate) fn document(context: impl Into<String>) -> impl FnOnce(SchemaError) -> Self {
        let context = context.into();
        move |source| Self::Document { context, source }
    }
}
