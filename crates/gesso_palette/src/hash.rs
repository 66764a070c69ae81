//! Content hashing for compile caches.

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Hash several fields as one key. Each part is length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn hash_parts<'p>(parts: impl IntoIterator<Item = &'p [u8]>) -> u64 {
    let mut hasher = Xxh3::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.digest()
}

/// 16 hex characters.
#[inline]
pub fn hash_to_hex(hash: u64) -> crate::String {
    crate::format_compact!("{:016x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consistency() {
        assert_eq!(hash_str("<div/>"), hash_str("<div/>"));
        assert_ne!(hash_str("<div/>"), hash_str("<span/>"));
    }

    #[test]
    fn test_hash_parts_boundaries() {
        let a = hash_parts([b"ab".as_slice(), b"c".as_slice()]);
        let b = hash_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_format() {
        let hex = hash_to_hex(hash_str("test"));
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
