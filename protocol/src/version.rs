//! Client version constants.
//!
//! Feature activations carry a minimum client version; a node running older
//! software than an activation demands will desynchronize the moment the
//! feature goes live, so the version number is consensus-relevant metadata,
//! not just a display string.

/// Major version — bump on consensus-breaking releases.
pub const CLIENT_VERSION_MAJOR: u32 = 0;

/// Minor version — bump on backward-compatible releases.
pub const CLIENT_VERSION_MINOR: u32 = 8;

/// Patch version — bump on non-consensus bug fixes.
pub const CLIENT_VERSION_PATCH: u32 = 2;

/// The packed integer form used in feature activation records:
/// `major * 1_000_000 + minor * 10_000 + patch * 100`.
pub const CLIENT_VERSION: u32 =
    CLIENT_VERSION_MAJOR * 1_000_000 + CLIENT_VERSION_MINOR * 10_000 + CLIENT_VERSION_PATCH * 100;

/// Human-readable version string, e.g. `"0.8.2"`.
pub fn client_version_string() -> String {
    format!(
        "{}.{}.{}",
        CLIENT_VERSION_MAJOR, CLIENT_VERSION_MINOR, CLIENT_VERSION_PATCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_version_matches_components() {
        assert_eq!(
            CLIENT_VERSION,
            CLIENT_VERSION_MAJOR * 1_000_000
                + CLIENT_VERSION_MINOR * 10_000
                + CLIENT_VERSION_PATCH * 100
        );
    }

    #[test]
    fn version_string_format() {
        let s = client_version_string();
        assert_eq!(s.split('.').count(), 3);
    }
}
