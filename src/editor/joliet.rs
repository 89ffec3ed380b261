//! Joliet name restrictions.

/// Longest name Joliet allows, in UTF-16 code units.
pub const JOLIET_MAX_NAME: usize = 64;

const FORBIDDEN: &[char] = &['*', '/', ':', ';', '?', '\\'];

/// True when `name` can be written to a Joliet directory record unchanged.
pub fn is_compatible(name: &str) -> bool {
    !name.is_empty()
        && name.encode_utf16().count() <= JOLIET_MAX_NAME
        && !name.chars().any(|c| c.is_control() || FORBIDDEN.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("readme.txt", true ; "plain name")]
    #[test_case("résumé – final.pdf", true ; "non ascii")]
    #[test_case("what?.txt", false ; "question mark")]
    #[test_case("a:b", false ; "colon")]
    #[test_case("semi;colon", false ; "semicolon")]
    #[test_case("back\\slash", false ; "backslash")]
    #[test_case("", false ; "empty")]
    fn test_names(name: &str, expected: bool) {
        assert_eq!(is_compatible(name), expected);
    }

    #[test]
    fn test_length_counts_utf16_units() {
        assert!(is_compatible(&"a".repeat(64)));
        assert!(!is_compatible(&"a".repeat(65)));
        // each of these takes a surrogate pair
        assert!(is_compatible(&"𝄞".repeat(32)));
        assert!(!is_compatible(&"𝄞".repeat(33)));
    }
}
