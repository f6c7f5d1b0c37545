use semver::Version;

/// Parse a package version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros, and accepts a
/// four-part version whose revision is zero ("1.2.3.0").
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2-beta" -> Version(1, 2, 0, pre = "beta")
/// - "1.2.3.0" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let (release, suffix) = match version.find(|c| c == '-' || c == '+') {
        Some(index) => version.split_at(index),
        None => (version, ""),
    };

    let parts: Vec<&str> = release.split('.').collect();
    let normalized = match parts.as_slice() {
        [major] => format!("{major}.0.0{suffix}"),
        [major, minor] => format!("{major}.{minor}.0{suffix}"),
        [_, _, _] => version.to_string(),
        [major, minor, patch, "0"] => format!("{major}.{minor}.{patch}{suffix}"),
        _ => return None,
    };
    Version::parse(&normalized).ok()
}

/// Parse a list of version strings, skipping any that are not valid versions
pub fn parse_versions(versions: &[String]) -> Vec<Version> {
    versions.iter().filter_map(|v| parse_version(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some("1.0.0"))]
    #[case("1.2", Some("1.2.0"))]
    #[case("1.2.3", Some("1.2.3"))]
    #[case("1.2.3.0", Some("1.2.3"))]
    #[case("1.2-beta", Some("1.2.0-beta"))]
    #[case("1.0.0-rc.1", Some("1.0.0-rc.1"))]
    #[case(" 2.0 ", Some("2.0.0"))]
    #[case("1.2.3.4", None)] // non-zero revision is not representable
    #[case("invalid", None)]
    #[case("", None)]
    fn parse_version_normalizes_partial_versions(
        #[case] input: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            parse_version(input).map(|v| v.to_string()),
            expected.map(|s| s.to_string())
        );
    }

    #[test]
    fn parse_versions_skips_invalid_entries() {
        let versions = vec![
            "1.0.0".to_string(),
            "not-a-version".to_string(),
            "2.1".to_string(),
        ];

        assert_eq!(
            parse_versions(&versions),
            vec![Version::new(1, 0, 0), Version::new(2, 1, 0)]
        );
    }
}
