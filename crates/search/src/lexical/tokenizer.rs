//! Tokenizer for the lexical index
//!
//! Lowercases, splits on non-alphanumeric boundaries, drops
//! single-character tokens and common Georgian/English stop words.
//! Georgian has no case distinction but the corpus mixes in Latin-script
//! legal references, so lowercasing still matters.

use std::collections::HashSet;
use std::sync::OnceLock;

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| {
        [
            // Georgian
            "და", "რომ", "არ", "არა", "ეს", "ამ", "იმ", "რა", "თუ", "ან", "იყო", "არის",
            "იქნა", "უნდა", "მისი", "მის", "მიერ", "შესახებ", "თანახმად", "როგორც", "ასევე",
            "ანუ", "კი", "მაგრამ", "იგი", "მას", "მან", "რაც", "სხვა",
            // English (Latin-script citations and boilerplate)
            "a", "an", "and", "are", "as", "at", "be", "by", "for", "in", "is", "it", "of",
            "on", "or", "the", "to", "with",
        ]
        .into_iter()
        .collect()
    })
}

/// Tokenize text: lowercase, split on non-alphanumeric, remove stop
/// words and single-character tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !stop_words().contains(*token))
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_georgian() {
        let tokens = tokenize("დავის საგანია საშემოსავლო გადასახადი და ჯარიმა");
        assert!(tokens.contains(&"საშემოსავლო".to_string()));
        assert!(tokens.contains(&"გადასახადი".to_string()));
        // stop word dropped
        assert!(!tokens.contains(&"და".to_string()));
    }

    #[test]
    fn test_tokenize_mixed_script() {
        let tokens = tokenize("გადაწყვეტილება N4521, VAT-ის შესახებ");
        assert!(tokens.contains(&"n4521".to_string()));
        assert!(tokens.contains(&"vat".to_string()));
        assert!(!tokens.contains(&"შესახებ".to_string()));
    }

    #[test]
    fn test_single_char_dropped() {
        let tokens = tokenize("ა ბ გ მუხლი");
        assert_eq!(tokens, vec!["მუხლი".to_string()]);
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ... !!!").is_empty());
    }
}
