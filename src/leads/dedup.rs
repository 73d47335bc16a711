use super::types::DedupKey;

/// Canonical phone: digits only, and only if exactly eleven of them remain.
/// Anything else degrades to the empty string instead of failing.
pub fn canonical_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 {
        digits
    } else {
        String::new()
    }
}

pub fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity fingerprint for a person: blake3 over `phone|email` after
/// canonicalization, as lowercase hex. Depends on nothing else in the record.
pub fn dedup_key(phone: &str, email: &str) -> DedupKey {
    let material = format!("{}|{}", canonical_phone(phone), canonical_email(email));
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let key = dedup_key("11987654321", "ana@example.com");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_formatting_does_not_matter() {
        let a = dedup_key("(11) 98765-4321", "  Ana@Example.COM ");
        let b = dedup_key("11987654321", "ana@example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn test_email_changes_key() {
        assert_ne!(
            dedup_key("11987654321", "ana@example.com"),
            dedup_key("11987654321", "ana.silva@example.com")
        );
    }

    #[test]
    fn test_phone_changes_key() {
        assert_ne!(
            dedup_key("11987654321", "ana@example.com"),
            dedup_key("11987654322", "ana@example.com")
        );
    }

    #[test]
    fn test_bad_phone_degrades_to_empty() {
        assert_eq!(canonical_phone("12345"), "");
        assert_eq!(canonical_phone("+55 (11) 98765-4321"), "");
        assert_eq!(
            dedup_key("12345", "ana@example.com"),
            dedup_key("", "ana@example.com")
        );
    }

    #[test]
    fn test_order_sensitive() {
        // Swapping the inputs must not collide.
        assert_ne!(dedup_key("11987654321", "x@y.z"), dedup_key("x@y.z", "11987654321"));
    }
}
