use crate::{CancelToken, RegistryClient, RegistryError};
use airgap_schema::{ImageRef, RepoPath};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One archive replayed into the mock registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub archive: PathBuf,
    pub destination: RepoPath,
    pub ca_cert: Option<PathBuf>,
    pub concurrency: usize,
}

#[derive(Default)]
struct MockState {
    tags: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<(String, Vec<u8>)>>,
    failing: HashSet<String>,
    archived: Vec<ImageRef>,
    pulled: Vec<ImageRef>,
    pushed: Vec<PushRecord>,
}

/// In-memory registry for tests.
///
/// Repositories are seeded with tags and images with files; archives are
/// written as small marker files so an import can find them on disk.
/// Any image reference, archive file name, or destination registered with
/// [`fail_on`](Self::fail_on) makes the matching call fail.
#[derive(Default)]
pub struct MockRegistry {
    state: Mutex<MockState>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>, RegistryError> {
        self.state
            .lock()
            .map_err(|e| RegistryError::Io(std::io::Error::other(format!("mutex poisoned: {e}"))))
    }

    fn state_unchecked(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn with_tags(self, repository: &str, tags: &[&str]) -> Self {
        self.state_unchecked().tags.insert(
            repository.to_owned(),
            tags.iter().map(|t| (*t).to_owned()).collect(),
        );
        self
    }

    /// Files that `pull_to_directory` writes for `image` (`repo/path:tag`).
    #[must_use]
    pub fn with_files(self, image: &str, files: &[(&str, &str)]) -> Self {
        self.state_unchecked().files.insert(
            image.to_owned(),
            files
                .iter()
                .map(|(name, content)| ((*name).to_owned(), content.as_bytes().to_vec()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn fail_on(self, reference: &str) -> Self {
        self.state_unchecked().failing.insert(reference.to_owned());
        self
    }

    /// Images copied to archives, in call order.
    pub fn archived(&self) -> Vec<ImageRef> {
        self.state_unchecked().archived.clone()
    }

    /// Images pulled into directories, in call order.
    pub fn pulled(&self) -> Vec<ImageRef> {
        self.state_unchecked().pulled.clone()
    }

    /// Archives pushed to the registry, in call order.
    pub fn pushed(&self) -> Vec<PushRecord> {
        self.state_unchecked().pushed.clone()
    }

    fn simulated_failure(what: &str) -> RegistryError {
        RegistryError::CommandFailed {
            command: format!("mock {what}"),
            status: "exit status: 1".to_owned(),
            stderr: "simulated registry failure".to_owned(),
        }
    }
}

impl RegistryClient for MockRegistry {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn copy_image_to_archive(
        &self,
        source: &ImageRef,
        archive: &Path,
        _concurrency: usize,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError> {
        cancel.check()?;
        let mut state = self.state()?;
        let reference = source.to_string();
        if state.failing.contains(&reference) {
            return Err(Self::simulated_failure(&format!("copy {reference}")));
        }
        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(archive, format!("mock-archive:{reference}\n"))?;
        state.archived.push(source.clone());
        Ok(())
    }

    fn copy_archive_to_registry(
        &self,
        archive: &Path,
        destination: &RepoPath,
        ca_cert: Option<&Path>,
        concurrency: usize,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError> {
        cancel.check()?;
        let mut state = self.state()?;
        if !archive.is_file() {
            return Err(RegistryError::NotFound(archive.display().to_string()));
        }
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if state.failing.contains(&file_name) || state.failing.contains(destination.as_str()) {
            return Err(Self::simulated_failure(&format!("push {file_name}")));
        }
        state.pushed.push(PushRecord {
            archive: archive.to_path_buf(),
            destination: destination.clone(),
            ca_cert: ca_cert.map(Path::to_path_buf),
            concurrency,
        });
        Ok(())
    }

    fn pull_to_directory(
        &self,
        source: &ImageRef,
        dir: &Path,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError> {
        cancel.check()?;
        let mut state = self.state()?;
        let reference = source.to_string();
        if state.failing.contains(&reference) {
            return Err(Self::simulated_failure(&format!("pull {reference}")));
        }
        let files = state
            .files
            .get(&reference)
            .ok_or_else(|| RegistryError::NotFound(reference.clone()))?;
        std::fs::create_dir_all(dir)?;
        for (name, content) in files {
            std::fs::write(dir.join(name), content)?;
        }
        state.pulled.push(source.clone());
        Ok(())
    }

    fn list_tags(
        &self,
        repository: &RepoPath,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, RegistryError> {
        cancel.check()?;
        let state = self.state()?;
        if state.failing.contains(repository.as_str()) {
            return Err(Self::simulated_failure(&format!("tag list {repository}")));
        }
        Ok(state.tags.get(repository.as_str()).cloned().unwrap_or_default())
    }
}
