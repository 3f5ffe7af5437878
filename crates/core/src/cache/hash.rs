//! Content-derived cache identity.

/// Compute the cache identity for a property's canonical display string.
///
/// 128-bit MD5 of the UTF-8 bytes, lowercase hex.
pub fn compute_identity(display: &str) -> String {
    let mut context = md5::Context::new();
    context.consume(display.as_bytes());
    hex::encode(context.compute().0)
}

/// Check that a string has the shape of an identity (32 lowercase hex chars).
pub fn is_identity(candidate: &str) -> bool {
    candidate.len() == 32 && candidate.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_stability() {
        let a = compute_identity("1 Main St Boston, MA 02101");
        let b = compute_identity("1 Main St Boston, MA 02101");
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_known_digest() {
        assert_eq!(compute_identity(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_identity_format() {
        let id = compute_identity("1 Main St Boston, MA 02101");
        assert_eq!(id.len(), 32);
        assert!(is_identity(&id));
    }

    #[test]
    fn test_identity_different_address() {
        assert_ne!(
            compute_identity("1 Main St Boston, MA 02101"),
            compute_identity("2 Main St Boston, MA 02101")
        );
    }

    #[test]
    fn test_is_identity_rejects_garbage() {
        assert!(!is_identity(""));
        assert!(!is_identity("D41D8CD98F00B204E9800998ECF8427E"));
        assert!(!is_identity("not-a-hash"));
    }
}
