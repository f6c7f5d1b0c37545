//! Best-fit version selection

use semver::Version;

use crate::version::range::VersionRange;

/// Pick the version that best satisfies a range from the available versions
///
/// The best match is the highest available version inside the range. For a range
/// with only a floor (including floating ranges) this is the highest version at or
/// above the floor, restricted to the float prefix when there is one.
///
/// # Returns
/// The selected version, or None if no available version satisfies the range
pub fn find_best_match<'a, I>(available: I, range: &VersionRange) -> Option<Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    available
        .into_iter()
        .filter(|v| range.satisfies(v))
        .max()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::semver::parse_version;
    use rstest::rstest;

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|s| parse_version(s).unwrap()).collect()
    }

    #[rstest]
    #[case("1.0", &["0.9.0", "1.0.0", "1.5.0", "2.0.0"], Some("2.0.0"))]
    #[case("[1.0, 2.0)", &["0.9.0", "1.0.0", "1.5.0", "2.0.0"], Some("1.5.0"))]
    #[case("[1.0]", &["0.9.0", "1.0.0", "1.5.0"], Some("1.0.0"))]
    #[case("1.*", &["1.0.0", "1.4.2", "2.0.0"], Some("1.4.2"))]
    #[case("1.2.*", &["1.2.0", "1.2.9", "1.3.0"], Some("1.2.9"))]
    #[case("*", &["0.1.0", "3.0.0", "4.0.0-beta"], Some("3.0.0"))]
    #[case("1.0.0-*", &["1.0.0-alpha", "1.0.0-beta"], Some("1.0.0-beta"))]
    #[case("1.0", &["1.0.0", "1.1.0-beta"], Some("1.0.0"))]
    #[case("3.0", &["1.0.0", "2.0.0"], None)]
    #[case("1.0", &[], None)]
    fn find_best_match_returns_expected(
        #[case] range: &str,
        #[case] available: &[&str],
        #[case] expected: Option<&str>,
    ) {
        let range: VersionRange = range.parse().unwrap();
        let available = versions(available);

        assert_eq!(
            find_best_match(&available, &range),
            expected.map(|s| parse_version(s).unwrap())
        );
    }

    #[test]
    fn find_best_match_ignores_input_order() {
        let range: VersionRange = "[1.0, 3.0)".parse().unwrap();
        let ascending = versions(&["1.0.0", "1.5.0", "2.9.0", "3.0.0"]);
        let mut descending = ascending.clone();
        descending.reverse();

        assert_eq!(
            find_best_match(&ascending, &range),
            find_best_match(&descending, &range)
        );
    }

    #[rstest]
    #[case("1.0")]
    #[case("[1.1, 2.5]")]
    #[case("(1.0, 3.0)")]
    #[case("2.*")]
    #[case("(, 2.0]")]
    #[case("1.0.0-*")]
    fn best_match_is_available_in_range_and_maximal(#[case] range: &str) {
        let range: VersionRange = range.parse().unwrap();
        let available = versions(&[
            "0.5.0",
            "1.0.0",
            "1.1.0",
            "1.5.0-rc.1",
            "2.0.0",
            "2.5.0",
            "3.0.0",
            "3.1.0",
        ]);

        let Some(best) = find_best_match(&available, &range) else {
            assert!(available.iter().all(|v| !range.satisfies(v)));
            return;
        };

        assert!(available.contains(&best));
        assert!(range.satisfies(&best));
        assert!(
            available
                .iter()
                .filter(|v| range.satisfies(v))
                .all(|v| v <= &best)
        );
    }
}
