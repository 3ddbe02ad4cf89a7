//! In-memory BM25 lexical index
//!
//! Built once over the full chunk corpus at startup and queried on the
//! sparse branch of every hybrid retrieval. Rebuilding after a corpus
//! update happens out-of-band: a fresh index is constructed and swapped
//! in whole, so concurrent readers observe either the old or the new
//! index, never a partial one.

mod tokenizer;

pub use tokenizer::tokenize;

use crate::Document;
use std::collections::HashMap;

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

/// A single entry in a term's postings list
#[derive(Debug, Clone)]
struct Posting {
    /// Index into `documents`
    doc: u32,
    /// Number of times the term appears in this document
    term_frequency: u32,
}

/// Inverted index with Okapi BM25 ranking over the chunk corpus
#[derive(Debug, Default)]
pub struct Bm25Index {
    documents: Vec<Document>,
    /// term → postings list
    index: HashMap<String, Vec<Posting>>,
    /// token count per document, for length normalization
    doc_lengths: Vec<u32>,
    total_doc_length: u64,
}

impl Bm25Index {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index over a corpus of documents
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut built = Self {
            documents: Vec::with_capacity(documents.len()),
            index: HashMap::new(),
            doc_lengths: Vec::with_capacity(documents.len()),
            total_doc_length: 0,
        };
        for document in documents {
            built.add_document(document);
        }
        built
    }

    fn add_document(&mut self, document: Document) {
        let doc = self.documents.len() as u32;
        let tokens = tokenize(&document.content);

        self.doc_lengths.push(tokens.len() as u32);
        self.total_doc_length += tokens.len() as u64;

        let mut tf_map: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *tf_map.entry(token).or_insert(0) += 1;
        }

        for (term, term_frequency) in tf_map {
            self.index.entry(term).or_default().push(Posting {
                doc,
                term_frequency,
            });
        }

        self.documents.push(document);
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the index holds no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn average_doc_length(&self) -> f32 {
        if self.documents.is_empty() {
            return 0.0;
        }
        self.total_doc_length as f32 / self.documents.len() as f32
    }

    /// Rank the corpus against the query and return the top-n documents
    /// by descending BM25 score. Deterministic: equal scores break by
    /// corpus position.
    pub fn rank(&self, query: &str, n: usize) -> Vec<Document> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.documents.is_empty() || n == 0 {
            return Vec::new();
        }

        let avgdl = self.average_doc_length();
        let corpus_size = self.documents.len() as f32;

        let mut scores: HashMap<u32, f32> = HashMap::new();

        for token in &query_tokens {
            if let Some(postings) = self.index.get(token.as_str()) {
                let df = postings.len() as f32;
                // IDF: log((N - df + 0.5) / (df + 0.5) + 1)
                let idf = ((corpus_size - df + 0.5) / (df + 0.5) + 1.0).ln();

                for posting in postings {
                    let dl = self.doc_lengths[posting.doc as usize] as f32;
                    let tf = posting.term_frequency as f32;

                    let tf_norm =
                        (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avgdl));

                    *scores.entry(posting.doc).or_insert(0.0) += idf * tf_norm;
                }
            }
        }

        let mut ranked: Vec<(u32, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(n);

        ranked
            .into_iter()
            .map(|(doc, _)| self.documents[doc as usize].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn doc(content: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            content: content.to_string(),
            case_number: None,
        }
    }

    fn build_corpus() -> Bm25Index {
        Bm25Index::from_documents(vec![
            doc("საშემოსავლო გადასახადის დარიცხვა და ჯარიმის გაუქმება"),
            doc("დღგ-ის ჩათვლა უარყოფილია შემოსავლების სამსახურის მიერ"),
            doc("საშემოსავლო გადასახადის განაკვეთი ფიზიკური პირისთვის"),
            doc("ქონების გადასახადი და საბაჟო დეკლარაცია"),
        ])
    }

    #[test]
    fn test_empty_query() {
        let index = build_corpus();
        assert!(index.rank("", 10).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = Bm25Index::new();
        assert!(index.rank("გადასახადი", 10).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_finds_matching_docs() {
        let index = build_corpus();
        let results = index.rank("საშემოსავლო გადასახადის", 10);
        assert!(results.len() >= 2);
        for result in &results[..2] {
            assert!(result.content.contains("საშემოსავლო"));
        }
    }

    #[test]
    fn test_ranking_order_by_term_frequency() {
        let index = Bm25Index::from_documents(vec![
            doc("ჯარიმა ჯარიმა ჯარიმა"),
            doc("ჯარიმა გაუქმება საურავი"),
        ]);
        let results = index.rank("ჯარიმა", 10);
        assert_eq!(results.len(), 2);
        assert!(results[0].content.starts_with("ჯარიმა ჯარიმა"));
    }

    #[test]
    fn test_truncation() {
        let index = build_corpus();
        let results = index.rank("გადასახადის გადასახადი", 2);
        assert!(results.len() <= 2);
    }

    #[test]
    fn test_no_match() {
        let index = build_corpus();
        assert!(index.rank("xyzzy", 10).is_empty());
    }

    #[test]
    fn test_rank_is_deterministic() {
        let index = build_corpus();
        let a = index.rank("გადასახადის დარიცხვა", 10);
        let b = index.rank("გადასახადის დარიცხვა", 10);
        let ids_a: Vec<_> = a.iter().map(|d| d.id).collect();
        let ids_b: Vec<_> = b.iter().map(|d| d.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
