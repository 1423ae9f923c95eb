//! Registry transfer capability for airgap bundles.
//!
//! This crate defines the four registry operations the bundler depends on
//! (`RegistryClient`), a cancellation token threaded through every call, a
//! production client that drives the `imgpkg` tool as a subprocess, and an
//! in-memory `MockRegistry` used by tests.

pub mod cancel;
pub mod imgpkg;
pub mod mock;

pub use cancel::{CancelToken, Interrupted};
pub use imgpkg::ImgpkgClient;
pub use mock::{MockRegistry, PushRecord};

use airgap_schema::{ImageRef, RepoPath};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("'{0}' not found; is imgpkg installed and on PATH?")]
    ToolNotFound(String),
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected registry output: {0}")]
    Serialization(String),
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// The registry operations the bundler needs, and nothing more.
///
/// Every call receives a [`CancelToken`]; implementations check it before
/// doing work and, for long-running transfers, while the work is in flight.
/// `concurrency` is passed through untouched: parallelism inside a single
/// transfer is the implementation's business.
pub trait RegistryClient: Send + Sync {
    fn name(&self) -> &str;

    /// Copy one image (or bundle) from a registry into a tar archive on disk.
    fn copy_image_to_archive(
        &self,
        source: &ImageRef,
        archive: &Path,
        concurrency: usize,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError>;

    /// Push a tar archive produced by [`copy_image_to_archive`](Self::copy_image_to_archive)
    /// into a destination repository, optionally trusting an extra CA certificate.
    fn copy_archive_to_registry(
        &self,
        archive: &Path,
        destination: &RepoPath,
        ca_cert: Option<&Path>,
        concurrency: usize,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError>;

    /// Pull the files carried by an image into a local directory.
    fn pull_to_directory(
        &self,
        source: &ImageRef,
        dir: &Path,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError>;

    /// List every tag of a repository, in no particular order.
    fn list_tags(
        &self,
        repository: &RepoPath,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, RegistryError>;
}
