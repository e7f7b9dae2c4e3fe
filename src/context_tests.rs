// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for context.rs

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_owner_key_round_trip() {
        let key = owner_key("root", "default", "my-ingress");
        assert_eq!(key, "root|default|my-ingress");
        assert_eq!(
            parse_owner_key(&key),
            Some(("root", "default", "my-ingress"))
        );
    }

    #[test]
    fn test_parse_owner_key_rejects_malformed_input() {
        assert_eq!(parse_owner_key(""), None);
        assert_eq!(parse_owner_key("root"), None);
        assert_eq!(parse_owner_key("root|default"), None);
    }

    #[test]
    fn test_parse_owner_key_name_may_contain_separator() {
        // splitn(3, ..) means any extra '|' characters land in the name part.
        assert_eq!(
            parse_owner_key("root|default|weird|name"),
            Some(("root", "default", "weird|name"))
        );
    }
}
