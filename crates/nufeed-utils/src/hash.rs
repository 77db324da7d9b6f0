use base64::Engine;
use sha2::{Digest, Sha512};

/// Name of the digest algorithm as advertised in the feed.
pub const HASH_ALGORITHM: &str = "SHA512";

/// Computes the base64-encoded SHA-512 digest of a byte slice.
///
/// # Example
///
/// ```
/// use nufeed_utils::hash::digest_bytes;
///
/// let digest = digest_bytes(b"");
/// assert!(digest.starts_with("z4PhNX7vuL3x"));
/// ```
pub fn digest_bytes(bytes: &[u8]) -> String {
    let digest = Sha512::digest(bytes);
    base64::engine::general_purpose::STANDARD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::digest_bytes;

    #[test]
    fn test_digest_bytes() {
        assert_eq!(
            digest_bytes(b"hello world\n"),
            "2zl0qX8kB7fK4a5jfAAwaHoRkTJ01XhJJVjjnBbAF96E6s3Ixi/jTuThK0sUKIF/Cbaidgw/imZM6ulNJDSlkw=="
        );
        assert_eq!(
            digest_bytes(b""),
            "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }
}
