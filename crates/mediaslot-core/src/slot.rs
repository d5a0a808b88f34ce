//! Slot identifiers and version suffixes
//!
//! A slot family shares a base name: `hero` is version 0, and regenerated
//! alternatives are stored under `hero-v2`, `hero-v3`, and so on.

/// Separator between a base slot name and its version number
const VERSION_MARKER: &str = "-v";

/// Lowest explicit version suffix; `-v0` and `-v1` are not versions.
pub const FIRST_EXPLICIT_VERSION: u32 = 2;

/// Version of `key` within the family of `base`.
///
/// Returns `Some(0)` for the bare base name, `Some(n)` for `base-vN` with
/// `N >= 2`, and `None` for keys outside the family or with a suffix that
/// does not parse as a version number.
pub fn slot_version(key: &str, base: &str) -> Option<u32> {
    if key == base {
        return Some(0);
    }
    let suffix = key.strip_prefix(base)?.strip_prefix(VERSION_MARKER)?;
    parse_version(suffix)
}

/// Split a slot key into its base name and version (0 when unversioned)
pub fn split_version(key: &str) -> (&str, u32) {
    if let Some(idx) = key.rfind(VERSION_MARKER) {
        let (base, rest) = key.split_at(idx);
        if !base.is_empty() {
            if let Some(version) = parse_version(&rest[VERSION_MARKER.len()..]) {
                return (base, version);
            }
        }
    }
    (key, 0)
}

/// Key of version `version` in the family of `base`
pub fn versioned_key(base: &str, version: u32) -> String {
    if version == 0 {
        base.to_string()
    } else {
        format!("{}{}{}", base, VERSION_MARKER, version)
    }
}

/// Filename stem used when a slot's selection is promoted.
///
/// Slot ids may be hierarchical (`services/hero`); the stable directory is
/// flat, so separators become dashes.
pub fn file_stem(slot: &str) -> String {
    slot.replace('/', "-")
}

fn parse_version(digits: &str) -> Option<u32> {
    // one spelling per version: `hero-v02` is not `hero-v2`
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits
        .parse::<u32>()
        .ok()
        .filter(|v| *v >= FIRST_EXPLICIT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_version_family() {
        assert_eq!(slot_version("hero", "hero"), Some(0));
        assert_eq!(slot_version("hero-v2", "hero"), Some(2));
        assert_eq!(slot_version("hero-v12", "hero"), Some(12));
    }

    #[test]
    fn test_slot_version_ignores_non_versions() {
        assert_eq!(slot_version("hero-vx", "hero"), None);
        assert_eq!(slot_version("hero-v", "hero"), None);
        assert_eq!(slot_version("hero-v1", "hero"), None);
        assert_eq!(slot_version("hero-v2-alt", "hero"), None);
        assert_eq!(slot_version("hero-v+3", "hero"), None);
        assert_eq!(slot_version("heroic", "hero"), None);
        assert_eq!(slot_version("about", "hero"), None);
        assert_eq!(slot_version("hero-v99999999999", "hero"), None);
        assert_eq!(slot_version("hero-v02", "hero"), None);
        assert_eq!(slot_version("hero-v010", "hero"), None);
    }

    #[test]
    fn test_split_version() {
        assert_eq!(split_version("hero-v3"), ("hero", 3));
        assert_eq!(split_version("hero"), ("hero", 0));
        assert_eq!(split_version("why-us-v2"), ("why-us", 2));
        assert_eq!(split_version("hero-vintage"), ("hero-vintage", 0));
        assert_eq!(split_version("-v2"), ("-v2", 0));
        assert_eq!(split_version("hero-v02"), ("hero-v02", 0));
    }

    #[test]
    fn test_versioned_key() {
        assert_eq!(versioned_key("hero", 0), "hero");
        assert_eq!(versioned_key("hero", 4), "hero-v4");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("services/cloud/hero"), "services-cloud-hero");
        assert_eq!(file_stem("why-us"), "why-us");
    }
}
