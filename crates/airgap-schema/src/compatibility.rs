use crate::SchemaError;
use serde::{Deserialize, Serialize};

/// Maps each platform version to the Kubernetes release versions it supports.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub management_cluster_versions: Vec<CompatibilityEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CompatibilityEntry {
    #[serde(rename = "version")]
    pub platform_version: String,
    #[serde(rename = "supportedKubernetesVersions", default)]
    pub release_versions: Vec<String>,
}

impl CompatibilityMetadata {
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, SchemaError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            SchemaError::malformed(format!("compatibility document is not valid UTF-8: {e}"))
        })?;
        serde_yaml::from_str(text).map_err(SchemaError::malformed)
    }

    /// Release versions of the first entry whose platform version matches exactly.
    pub fn release_versions_for(&self, platform_version: &str) -> Option<&[String]> {
        self.management_cluster_versions
            .iter()
            .find(|entry| entry.platform_version == platform_version)
            .map(|entry| entry.release_versions.as_slice())
    }
}
