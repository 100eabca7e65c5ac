/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Slug Normalizer (component C).
//!
//! Derives a `^[a-z0-9-]+$` slug from arbitrary title text, and validates
//! slugs supplied directly by callers. Used by the Content Storage Service
//! when a create request carries no explicit slug.

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());
static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Returns true if `candidate` already matches the slug grammar.
pub fn is_valid(candidate: &str) -> bool {
    !candidate.is_empty() && SLUG_PATTERN.is_match(candidate)
}

/// Normalizes arbitrary text into a slug: lowercase, non-alphanumeric runs
/// collapsed to a single hyphen, leading/trailing hyphens trimmed.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let collapsed = NON_SLUG_CHARS.replace_all(&lowered, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(is_valid("hello-world"));
        assert!(is_valid("abc123"));
        assert!(!is_valid("Hello World"));
        assert!(!is_valid(""));
        assert!(!is_valid("hello_world"));
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Hello World"), "hello-world");
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize("What's New?!"), "what-s-new");
    }

    #[test]
    fn test_normalize_trims_edges() {
        assert_eq!(normalize("  -- Leading And Trailing -- "), "leading-and-trailing");
    }

    #[test]
    fn test_normalize_already_valid() {
        assert_eq!(normalize("already-a-slug"), "already-a-slug");
    }
}
