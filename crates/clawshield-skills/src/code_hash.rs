//! `getCodeHash`: the stable cache key callers use to avoid re-analyzing identical code.

use sha2::{Digest, Sha256};

/// Lowercase SHA-256 hex digest of the UTF-8 encoding of `code`. Pure: equal inputs
/// produce equal outputs, distinct inputs practically never collide.
pub fn code_hash(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_inputs_produce_equal_hashes() {
        assert_eq!(code_hash("const x = 1;"), code_hash("const x = 1;"));
    }

    #[test]
    fn distinct_inputs_produce_distinct_hashes() {
        assert_ne!(code_hash("const x = 1;"), code_hash("const x = 2;"));
    }

    #[test]
    fn hash_is_lowercase_hex_of_expected_length() {
        let hash = code_hash("");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
