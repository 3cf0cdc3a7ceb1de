//! Checksum calculation for migration scripts

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of a migration script
///
/// Used to detect scripts that were edited after being applied.
/// Returns the lowercase hexadecimal digest.
pub fn calculate_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = calculate_checksum(b"{\"up\": [], \"down\": []}");
        let b = calculate_checksum(b"{\"up\": [], \"down\": []}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_checksum_changes_with_content() {
        assert_ne!(calculate_checksum(b"a"), calculate_checksum(b"b"));
        assert_eq!(
            calculate_checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
