use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the manifest file written next to the archives of a bundle.
pub const MANIFEST_FILE_NAME: &str = "publish-images-fromtar.yaml";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("manifest corrupt at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("manifest I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest serialize error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Archive name → destination repository mapping of one bundle.
///
/// Filled during export and written once at the end of a successful run;
/// read back wholesale on the import side. Entries are kept sorted by
/// archive name so identical runs produce identical files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an archive. An archive name seen before is overwritten and the
    /// previous destination returned.
    pub fn append(
        &mut self,
        archive_name: impl Into<String>,
        destination: impl Into<String>,
    ) -> Option<String> {
        self.entries.insert(archive_name.into(), destination.into())
    }

    pub fn destination(&self, archive_name: &str) -> Option<&str> {
        self.entries.get(archive_name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_yaml(&self) -> Result<String, LedgerError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the whole ledger in one shot: temp file in the target directory,
    /// fsync, rename. Readers see either the old file or the complete new one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let path = path.as_ref();
        let content = self.to_yaml()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LedgerError::Io(e.error))?;
        // Fsync parent directory to ensure rename durability on power loss.
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let content = match fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(LedgerError::Io(e)),
        };
        Self::from_yaml(&content).map_err(|reason| LedgerError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_yaml(content: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(content).map_err(|e| format!("not valid UTF-8: {e}"))?;
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }
}
