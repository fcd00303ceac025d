use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a reported violation.
///
/// Identity fields:
/// - template kind
/// - constraint name
/// - case name
/// - violation message
/// - violation path (if present)
pub fn fingerprint_for_violation(
    template: &str,
    constraint: &str,
    case: &str,
    message: &str,
    path: Option<&str>,
) -> String {
    let mut parts = vec![template, constraint, case, message];
    if let Some(p) = path {
        parts.push(p);
    }
    let canonical = parts.join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_sensitive_to_every_field() {
        let base = fingerprint_for_violation("K", "c", "case", "msg", Some("a.b"));
        assert_eq!(base.len(), 64);
        assert_eq!(
            base,
            fingerprint_for_violation("K", "c", "case", "msg", Some("a.b"))
        );
        assert_ne!(base, fingerprint_for_violation("K", "c", "case", "msg", None));
        assert_ne!(
            base,
            fingerprint_for_violation("K", "c", "other", "msg", Some("a.b"))
        );
    }
}
