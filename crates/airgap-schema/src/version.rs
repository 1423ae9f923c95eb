/// A `major.minor.patch` triple. Ordering is lexicographic over the three
/// integers; pre-release and build metadata are not part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTriplet {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

/// Parse a tag of the form `[v]<major>.<minor>.<patch>`.
///
/// A single literal leading `v` is stripped; the rest must be exactly three
/// dot-separated runs of ASCII digits.
pub fn parse_version_tag(tag: &str) -> Option<VersionTriplet> {
    let rest = tag.strip_prefix('v').unwrap_or(tag);
    let mut parts = rest.split('.');
    let major = parse_component(parts.next()?)?;
    let minor = parse_component(parts.next()?)?;
    let patch = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(VersionTriplet {
        major,
        minor,
        patch,
    })
}

fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A platform version is valid when it is `v<major>.<minor>.<patch>` with a mandatory `v`.
pub fn is_valid_version_tag(tag: &str) -> bool {
    tag.starts_with('v') && parse_version_tag(tag).is_some()
}

/// Release versions carry semver build metadata (`v1.21.2+vmware.1`), but `+`
/// is not a legal OCI tag character, so release BOM images are tagged with `_`.
pub fn underscored_plus(version: &str) -> String {
    version.replace('+', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_platform_versions() {
        assert!(is_valid_version_tag("v1.2.3"));
        assert!(is_valid_version_tag("v0.0.0"));
        assert!(is_valid_version_tag("v10.20.30"));
    }

    #[test]
    fn invalid_platform_versions() {
        for tag in ["1.2.3", "v1.2", "v1.2.3.4", "", "v", "v1..3", "v1.2.x", "vv1.2.3"] {
            assert!(!is_valid_version_tag(tag), "{tag:?} must be rejected");
        }
    }

    #[test]
    fn rejects_signed_components() {
        assert!(parse_version_tag("v+1.2.3").is_none());
        assert!(parse_version_tag("v1.-2.3").is_none());
    }

    #[test]
    fn parse_without_prefix() {
        let v = parse_version_tag("1.10.0").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 10, 0));
    }

    #[test]
    fn ordering_is_numeric_not_textual() {
        let a = parse_version_tag("v1.2.0").unwrap();
        let b = parse_version_tag("v1.10.0").unwrap();
        let c = parse_version_tag("v2.0.0").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn underscored_plus_replaces_all() {
        assert_eq!(
            underscored_plus("v1.21.2+vmware.1-tkg.1+x"),
            "v1.21.2_vmware.1-tkg.1_x"
        );
        assert_eq!(underscored_plus("v1.22.0"), "v1.22.0");
    }
}
