//! Candidate merging
//!
//! Unions the dense and sparse hit sets into one candidate sequence.
//! The deduplication key is exact content equality, not document
//! identity: two chunks with identical text collapse to one candidate.
//! First-seen order is preserved with dense results enumerated before
//! sparse, which fixes the tie-break order of the later stable sort.

use crate::{Candidate, Document};
use std::collections::HashMap;

/// Merge dense and sparse retriever outputs into a deduplicated
/// candidate sequence. Output length ≤ dense + sparse.
pub fn merge_candidates(dense: Vec<Document>, sparse: Vec<Document>) -> Vec<Candidate> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Candidate> = Vec::with_capacity(dense.len() + sparse.len());

    for document in dense {
        match seen.get(&document.content) {
            Some(&at) => merged[at].origin_dense = true,
            None => {
                seen.insert(document.content.clone(), merged.len());
                merged.push(Candidate {
                    document,
                    origin_dense: true,
                    origin_sparse: false,
                });
            }
        }
    }

    for document in sparse {
        match seen.get(&document.content) {
            Some(&at) => merged[at].origin_sparse = true,
            None => {
                seen.insert(document.content.clone(), merged.len());
                merged.push(Candidate {
                    document,
                    origin_dense: false,
                    origin_sparse: true,
                });
            }
        }
    }

    merged
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

    #[test]
    fn test_union_with_dedup() {
        // dense {A,B,C}, sparse {B,D} → {A,B,C,D}
        let dense = vec![doc("A"), doc("B"), doc("C")];
        let sparse = vec![doc("B"), doc("D")];

        let merged = merge_candidates(dense, sparse);

        let contents: Vec<&str> = merged.iter().map(|c| c.document.content.as_str()).collect();
        assert_eq!(contents, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_shared_hit_keeps_both_origins() {
        let merged = merge_candidates(vec![doc("B")], vec![doc("B")]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].origin_dense);
        assert!(merged[0].origin_sparse);
    }

    #[test]
    fn test_dense_enumerated_before_sparse() {
        let merged = merge_candidates(vec![doc("X")], vec![doc("Y")]);
        assert!(merged[0].origin_dense);
        assert!(merged[1].origin_sparse);
    }

    #[test]
    fn test_duplicate_content_within_one_retriever() {
        // Two distinct chunks with identical text collapse to one
        let merged = merge_candidates(vec![doc("same"), doc("same")], vec![]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_both_empty() {
        assert!(merge_candidates(vec![], vec![]).is_empty());
    }
}
