//! Dotted Version Comparison
//!
//! Numeric, segment-wise ordering of version strings such as `7.4.3`.
//! Shorter versions are padded with zero segments, so `5.2` equals `5.2.0`.

use std::cmp::Ordering;
use std::fmt;

/// A parsed dotted-numeric version
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    /// Parse a version string; `None` for empty input.
    ///
    /// Each segment contributes its leading decimal digits, so vendor
    /// suffixes (`7.4.3-1ubuntu`) are ignored and a segment with no
    /// digits counts as zero.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let segments = trimmed
            .split('.')
            .map(leading_number)
            .collect();

        Some(Self { segments })
    }

    /// Numeric segments as parsed
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

fn leading_number(segment: &str) -> u64 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    // Saturate absurdly long segments rather than failing the comparison
    digits.parse().unwrap_or(if digits.is_empty() { 0 } else { u64::MAX })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in 0..std::cmp::max(self.segments.len(), other.segments.len()) {
            let part1 = self.segments.get(i).copied().unwrap_or(0);
            let part2 = other.segments.get(i).copied().unwrap_or(0);

            match part1.cmp(&part2) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Whether `actual >= required`.
///
/// A missing or empty `actual` is never compatible. An empty `required`
/// is always satisfied.
pub fn compare(actual: Option<&str>, required: &str) -> bool {
    let required = match Version::parse(required) {
        Some(version) => version,
        None => return true,
    };

    match actual.and_then(Version::parse) {
        Some(actual) => actual >= required,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_padding() {
        assert!(compare(Some("5.2"), "5.2.0"));
        assert!(compare(Some("5.2.0"), "5.2"));
        assert_eq!(Version::parse("5.2").unwrap(), Version::parse("5.2.0.0").unwrap());
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert!(compare(Some("5.10"), "5.9"));
        assert!(!compare(Some("5.9"), "5.10"));
        assert!(compare(Some("10.0"), "9.9.9"));
    }

    #[test]
    fn test_missing_actual_is_incompatible() {
        assert!(!compare(None, "4.0"));
        assert!(!compare(Some(""), "4.0"));
        assert!(!compare(Some("   "), "4.0"));
    }

    #[test]
    fn test_empty_requirement_is_satisfied() {
        assert!(compare(Some("1.0"), ""));
        assert!(compare(None, ""));
    }

    #[test]
    fn test_vendor_suffixes() {
        assert!(compare(Some("7.4.3-1ubuntu2"), "7.0"));
        assert!(!compare(Some("6.4.0-beta"), "7.0"));
        assert_eq!(Version::parse("5.0-rc.1").unwrap().segments(), &[5, 0, 1]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::parse("7.4.3-dev").unwrap().to_string(), "7.4.3");
    }

    fn padded(v: &[u64], len: usize) -> Vec<u64> {
        let mut out = v.to_vec();
        out.resize(len, 0);
        out
    }

    proptest! {
        #[test]
        fn prop_matches_padded_lexicographic(
            a in prop::collection::vec(0u64..50, 1..5),
            b in prop::collection::vec(0u64..50, 1..5),
        ) {
            let a_str = a.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(".");
            let b_str = b.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(".");
            let len = a.len().max(b.len());
            let expected = padded(&a, len) >= padded(&b, len);

            prop_assert_eq!(compare(Some(&a_str), &b_str), expected);
        }

        #[test]
        fn prop_reflexive(a in prop::collection::vec(0u64..1000, 1..6)) {
            let a_str = a.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(".");
            prop_assert!(compare(Some(&a_str), &a_str));
        }
    }
}
