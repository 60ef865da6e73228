//! Visitor identifier generation

use uuid::Uuid;

/// Generate a random RFC 4122 version-4 UUID in hyphenated lowercase form
///
/// Randomness comes from the operating system CSPRNG, so identifiers are not
/// predictable from earlier ones.
pub fn generate_uuid() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_shape() {
        let id = generate_uuid();
        assert_eq!(id.len(), 36);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(
            parts.iter().map(|p| p.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(id.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn test_version_and_variant_bits() {
        let id = generate_uuid();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);

        // version nibble is the first char of the third group
        assert_eq!(&id[14..15], "4");
        // variant: first char of the fourth group is 8, 9, a or b
        assert!(matches!(&id[19..20], "8" | "9" | "a" | "b"));
    }

    #[test]
    fn test_uuids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_uuid()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
