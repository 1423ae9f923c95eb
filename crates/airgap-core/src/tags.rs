use crate::CoreError;
use airgap_registry::{CancelToken, RegistryClient};
use airgap_schema::{parse_version_tag, RepoPath, VersionTriplet};
use tracing::debug;

/// Highest `v<major>.<minor>.<patch>` tag published in `repository`.
pub fn select_latest_tag(
    client: &dyn RegistryClient,
    repository: &RepoPath,
    cancel: &CancelToken,
) -> Result<String, CoreError> {
    let tags = client
        .list_tags(repository, cancel)
        .map_err(CoreError::registry(format!("list tags of {repository}")))?;
    let latest = latest_tag(repository, &tags)?;
    debug!("latest tag of {repository}: {latest} (of {})", tags.len());
    Ok(latest)
}

/// Pick the greatest tag by its (major, minor, patch) tuple.
///
/// Every tag must parse; a single malformed tag aborts the selection rather
/// than being skipped. Ties keep the first tag seen.
pub fn latest_tag(repository: &str, tags: &[String]) -> Result<String, CoreError> {
    let mut best: Option<(VersionTriplet, &String)> = None;
    for tag in tags {
        let version = parse_version_tag(tag).ok_or_else(|| CoreError::InvalidTagFormat {
            repository: repository.to_owned(),
            tag: tag.clone(),
        })?;
        match best {
            Some((current, _)) if version <= current => {}
            _ => best = Some((version, tag)),
        }
    }
    best.map(|(_, tag)| tag.clone())
        .ok_or_else(|| CoreError::NoTagsFound(repository.to_owned()))
}
