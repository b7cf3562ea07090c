// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Free-text search used by list filters: one term, matched as a
//! case-insensitive substring against a fixed set of text fields.

/// The trimmed term, or `None` when the filter carries no usable search.
pub fn search_term(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|term| !term.is_empty())
}

pub fn contains_term(field: &str, term: &str) -> bool {
    field.to_lowercase().contains(&term.to_lowercase())
}

/// True when `term` occurs in any of `fields`.
pub fn any_field_contains(fields: &[&str], term: &str) -> bool {
    fields.iter().any(|field| contains_term(field, term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_is_no_search() {
        assert_eq!(search_term(&None), None);
        assert_eq!(search_term(&Some("   ".to_string())), None);
        assert_eq!(search_term(&Some(" taj ".to_string())), Some("taj"));
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert!(contains_term("Taj Mahal Restaurant", "mahal"));
        assert!(!contains_term("Burger Palace", "pizza"));
        assert!(any_field_contains(&["Spice Garden", "South Indian classics"], "INDIAN"));
    }
}
