//! Document store boundary
//!
//! The engine consumes the store through this trait so the pipeline can
//! be exercised against in-memory fakes. The production implementation
//! is the Postgres repository.

use crate::Document;
use async_trait::async_trait;
use rsge_common::db::{ChunkHit, Repository};
use rsge_common::errors::Result;

/// Query interface the retrieval core needs from the document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All chunks filed under the case number, in document order. The
    /// returned documents carry the owning decision's id, since the
    /// exact path reassembles them into one synthetic document.
    async fn by_case_number(&self, case_number: &str) -> Result<Vec<Document>>;

    /// The `limit` nearest chunks to the query embedding, ordered by
    /// increasing distance. The store excludes duplicates by identity.
    async fn nearest(&self, embedding: &[f32], limit: usize) -> Result<Vec<Document>>;
}

fn chunk_document(hit: ChunkHit) -> Document {
    Document {
        id: hit.chunk_id,
        content: hit.content,
        case_number: hit.case_number,
    }
}

#[async_trait]
impl DocumentStore for Repository {
    async fn by_case_number(&self, case_number: &str) -> Result<Vec<Document>> {
        let hits = self.chunks_by_case_number(case_number).await?;
        Ok(hits
            .into_iter()
            .map(|hit| Document {
                id: hit.decision_id,
                content: hit.content,
                case_number: hit.case_number,
            })
            .collect())
    }

    async fn nearest(&self, embedding: &[f32], limit: usize) -> Result<Vec<Document>> {
        let hits = self.nearest_chunks(embedding, limit).await?;
        Ok(hits.into_iter().map(chunk_document).collect())
    }
}
