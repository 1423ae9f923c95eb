use airgap_schema::{ArchiveName, ImageRef, RepoPath};
use serde::Serialize;
use std::fmt;

/// Which step of the resolution produced a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    PlatformCompatibility,
    PlatformBom,
    ReleaseCompatibility,
    ReleaseBom,
    Component,
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PlatformCompatibility => "platform-compatibility",
            Self::PlatformBom => "platform-bom",
            Self::ReleaseCompatibility => "release-compatibility",
            Self::ReleaseBom => "release-bom",
            Self::Component => "component",
        })
    }
}

/// One image to transfer: pulled from `source`, stored as `archive_name`,
/// replayed into `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub archive_name: ArchiveName,
    pub source: ImageRef,
    pub destination: RepoPath,
    pub kind: WorkKind,
}

/// The resolved transfer plan for one platform version.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bundle {
    pub platform_version: String,
    pub release_versions: Vec<String>,
    pub items: Vec<WorkItem>,
}

impl Bundle {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: WorkKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }
}

/// `<relative with '/' replaced by '-'>-<tag>.tar`.
pub fn archive_name(relative: &str, tag: &str) -> ArchiveName {
    let stem = relative.trim_matches('/').replace('/', "-");
    ArchiveName::new(format!("{stem}-{tag}.tar"))
}

/// Source and destination registry roots of one run.
#[derive(Debug, Clone)]
pub(crate) struct Roots {
    pub source: RepoPath,
    pub destination: RepoPath,
}

impl Roots {
    pub fn new(source: &str, destination: &str) -> Self {
        Self {
            source: RepoPath::new(source.trim_end_matches('/')),
            destination: RepoPath::new(destination.trim_end_matches('/')),
        }
    }

    /// Work item for `<source>/<relative>:<tag>` → `<destination>/<relative>`.
    pub fn item(&self, relative: &str, tag: &str, kind: WorkKind) -> WorkItem {
        WorkItem {
            archive_name: archive_name(relative, tag),
            source: ImageRef {
                path: self.source.join(relative),
                tag: tag.to_owned(),
            },
            destination: self.destination.join(relative),
            kind,
        }
    }
}
