//! Exact-match routing
//!
//! A question that names a case number ("საქმეზე 4521") wants that
//! specific decision, not a similarity ranking. The router extracts the
//! identifier with a pure text scan; the engine then performs the store
//! lookup and branches on the outcome.

use crate::Document;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Outcome of the exact-match store lookup. A recognized number that
/// matches nothing in the store is a `Miss` and falls through to the
/// hybrid path: queries may mention amounts or dates that merely look
/// like case numbers.
#[derive(Debug, Clone)]
pub enum CaseLookup {
    /// Chunks filed under the matched identifier, in document order
    Hit(Vec<Document>),
    Miss,
}

fn case_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4,6}").expect("static pattern"))
}

/// Extract a case identifier: the first run of 4-6 consecutive digits
/// in left-to-right scan order. First match wins, not longest match.
pub fn extract_case_number(query: &str) -> Option<String> {
    case_number_pattern()
        .find(query)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_case_number() {
        assert_eq!(
            extract_case_number("რა გადაწყვეტილება იქნა მიღებული საქმეზე 4521?"),
            Some("4521".to_string())
        );
    }

    #[test]
    fn test_no_digits() {
        assert_eq!(extract_case_number("რას ამბობს კანონი დღგ-ზე?"), None);
    }

    #[test]
    fn test_short_run_ignored() {
        // A three-digit run is not a case number
        assert_eq!(extract_case_number("მუხლი 275 პუნქტი 3"), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            extract_case_number("საქმეები 4521 და 90210"),
            Some("4521".to_string())
        );
    }

    #[test]
    fn test_six_digit_cap() {
        // A longer run yields its first six digits, mirroring the
        // greedy bounded repetition of the scan
        assert_eq!(
            extract_case_number("თანხა 12345678"),
            Some("123456".to_string())
        );
    }
}
