//! Scraped document parsing
//!
//! The scraper leaves one JSON file per tribunal document. This module
//! normalizes the raw text and extracts the structured metadata the
//! retrieval side depends on: the case number and the document kind.

use regex_lite::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// How many characters of the document head carry the number and kind.
/// Character-based: the corpus is Georgian, byte slicing would split
/// code points.
const HEAD_CHARS: usize = 300;

/// Raw scraped file layout
#[derive(Debug, Deserialize)]
pub struct ScrapedFile {
    pub id: String,
    pub document: ScrapedDocument,
}

#[derive(Debug, Deserialize)]
pub struct ScrapedDocument {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A decision ready for chunking and storage
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDecision {
    pub source_id: String,
    pub title: String,
    pub case_number: Option<String>,
    pub kind: String,
    pub content: String,
}

fn order_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Order number: "N 12345" in the document head
    PATTERN.get_or_init(|| Regex::new(r"N\s*(\d{4,6})").expect("static pattern"))
}

fn case_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Court case citation: "123/45/2024"
    PATTERN.get_or_init(|| Regex::new(r"\d{1,6}/\d{1,3}/\d{4}").expect("static pattern"))
}

/// Strip NBSP and zero-width characters the scraper picks up
pub fn normalize_text(text: &str) -> String {
    text.replace('\u{a0}', " ").replace('\u{200b}', "").trim().to_string()
}

fn head(text: &str) -> String {
    text.chars().take(HEAD_CHARS).collect()
}

/// Parse a scraped file into a decision. Returns `None` when the file
/// carries no usable text.
pub fn parse_decision(raw: &str) -> Result<Option<ParsedDecision>, serde_json::Error> {
    let file: ScrapedFile = serde_json::from_str(raw)?;

    let content = normalize_text(&file.document.content);
    if content.is_empty() {
        return Ok(None);
    }

    let head = head(&content);

    let kind = if head.contains("გადაწყვეტილება") {
        "გადაწყვეტილება"
    } else {
        "ბრძანება"
    };

    let case_number = order_pattern()
        .captures(&head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            case_pattern()
                .find(&head)
                .map(|m| m.as_str().to_string())
        });

    let title = match &case_number {
        Some(number) => format!("დოკუმენტის #:{}", number),
        None => format!("დოკუმენტი {}", file.id.chars().take(8).collect::<String>()),
    };

    Ok(Some(ParsedDecision {
        source_id: file.id,
        title,
        case_number,
        kind: kind.to_string(),
        content,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(content: &str) -> String {
        serde_json::json!({
            "id": "3f2a9c1d-77b4-4e0e-9a57-0d1c2b3a4f5e",
            "document": { "content": content, "title": "Document" }
        })
        .to_string()
    }

    #[test]
    fn test_normalize_strips_artifacts() {
        assert_eq!(normalize_text("  ტექსტი\u{a0}აქ\u{200b} "), "ტექსტი აქ");
    }

    #[test]
    fn test_order_number_extracted() {
        let parsed = parse_decision(&raw("გადაწყვეტილება N 4521 საგადასახადო დავაზე"))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.case_number.as_deref(), Some("4521"));
        assert_eq!(parsed.kind, "გადაწყვეტილება");
        assert_eq!(parsed.title, "დოკუმენტის #:4521");
    }

    #[test]
    fn test_case_citation_fallback() {
        let parsed = parse_decision(&raw("ბრძანება საქმეზე 123/45/2024 განხილვის შესახებ"))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.case_number.as_deref(), Some("123/45/2024"));
        assert_eq!(parsed.kind, "ბრძანება");
    }

    #[test]
    fn test_no_number() {
        let parsed = parse_decision(&raw("ბრძანება დავის განხილვის შესახებ"))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.case_number, None);
        assert_eq!(parsed.title, "დოკუმენტი 3f2a9c1d");
    }

    #[test]
    fn test_number_outside_head_ignored() {
        let mut content = "ბრძანება დავის შესახებ ".to_string();
        content.push_str(&"ა".repeat(300));
        content.push_str(" N 4521");
        let parsed = parse_decision(&raw(&content)).unwrap().unwrap();
        assert_eq!(parsed.case_number, None);
    }

    #[test]
    fn test_empty_content_skipped() {
        assert!(parse_decision(&raw("   ")).unwrap().is_none());
    }
}
