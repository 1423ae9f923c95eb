//! Newtype wrappers for string identifiers and the `ImageRef` value type.
//!
//! All newtypes serialize/deserialize as plain strings so the manifest file
//! keeps its flat `archive: destination` shape.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// File name of one image archive inside a bundle directory, e.g. `tkr-bom-v1.21.0.tar`.
    ArchiveName
);

string_newtype!(
    /// Slash-separated repository path, without a tag.
    RepoPath
);

impl RepoPath {
    /// Join a relative path under this repository root, the way `path.Join` would:
    /// redundant slashes on either side are dropped.
    pub fn join(&self, relative: &str) -> RepoPath {
        let root = self.0.trim_end_matches('/');
        let relative = relative.trim_start_matches('/');
        if root.is_empty() {
            return RepoPath::new(relative);
        }
        if relative.is_empty() {
            return RepoPath::new(root);
        }
        RepoPath(format!("{root}/{relative}"))
    }
}

/// A single image in a source or destination registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub path: RepoPath,
    pub tag: String,
}

impl ImageRef {
    pub fn new(path: impl Into<String>, tag: impl Into<String>) -> Result<Self, SchemaError> {
        let path = path.into();
        let tag = tag.into();
        if path.trim_matches('/').is_empty() || tag.is_empty() {
            return Err(SchemaError::InvalidImageRef(format!("{path}:{tag}")));
        }
        Ok(Self {
            path: RepoPath::new(path),
            tag,
        })
    }

    /// Parse `repo/path:tag`. A colon that belongs to a registry port
    /// (`host:5000/repo`) is not mistaken for the tag separator.
    pub fn parse(reference: &str) -> Result<Self, SchemaError> {
        match reference.rsplit_once(':') {
            Some((path, tag)) if !tag.contains('/') => Self::new(path, tag),
            _ => Err(SchemaError::InvalidImageRef(reference.to_owned())),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_display_and_as_ref() {
        let name = ArchiveName::new("tkg-bom-v1.5.0.tar");
        assert_eq!(name.to_string(), "tkg-bom-v1.5.0.tar");
        assert_eq!(name.as_str(), "tkg-bom-v1.5.0.tar");
        assert_eq!(AsRef::<str>::as_ref(&name), "tkg-bom-v1.5.0.tar");
    }

    #[test]
    fn repo_path_serializes_as_plain_string() {
        let path = RepoPath::new("registry.local/tkg/etcd");
        let yaml = serde_yaml::to_string(&path).unwrap();
        assert_eq!(yaml.trim(), "registry.local/tkg/etcd");
        let back: RepoPath = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn repo_path_join_drops_redundant_slashes() {
        let root = RepoPath::new("registry.local/tkg/");
        assert_eq!(root.join("/etcd"), "registry.local/tkg/etcd");
        assert_eq!(root.join("kube/proxy"), "registry.local/tkg/kube/proxy");
        assert_eq!(root.join(""), "registry.local/tkg");
        assert_eq!(RepoPath::new("").join("etcd"), "etcd");
    }

    #[test]
    fn image_ref_rejects_empty_parts() {
        assert!(ImageRef::new("", "v1").is_err());
        assert!(ImageRef::new("/", "v1").is_err());
        assert!(ImageRef::new("etcd", "").is_err());
        assert!(ImageRef::new("etcd", "v3.4.13").is_ok());
    }

    #[test]
    fn image_ref_display() {
        let img = ImageRef::new("projects.example.com/tkg/etcd", "v3.4.13_vmware.15").unwrap();
        assert_eq!(
            img.to_string(),
            "projects.example.com/tkg/etcd:v3.4.13_vmware.15"
        );
    }

    #[test]
    fn image_ref_parse_handles_registry_port() {
        let img = ImageRef::parse("localhost:5000/tkg/etcd:v1").unwrap();
        assert_eq!(img.path, "localhost:5000/tkg/etcd");
        assert_eq!(img.tag, "v1");
        assert!(ImageRef::parse("localhost:5000/tkg/etcd").is_err());
        assert!(ImageRef::parse("etcd").is_err());
    }
}
