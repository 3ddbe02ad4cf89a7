//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations:
//! exact case-number lookup, nearest-neighbor search over pgvector
//! embeddings, paged corpus scans, and ingestion writes.

use crate::errors::Result;
use crate::db::models::*;
use crate::db::DbPool;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk row as seen by the retrieval pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkHit {
    pub chunk_id: Uuid,
    pub decision_id: Uuid,
    pub case_number: Option<String>,
    pub content: String,
    pub chunk_index: i32,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Query path
    // ========================================================================

    /// All chunks filed under a case number, in document order.
    /// Used by the exact-match path to reassemble the full decision text.
    pub async fn chunks_by_case_number(&self, case_number: &str) -> Result<Vec<ChunkHit>> {
        let sql = r#"
            SELECT
                c.id as chunk_id,
                c.decision_id,
                d.case_number,
                c.content,
                c.chunk_index
            FROM chunks c
            JOIN decisions d ON c.decision_id = d.id
            WHERE d.case_number = $1
            ORDER BY d.created_at, c.chunk_index
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![case_number.into()],
        );

        let rows = self.read_conn().query_all(stmt).await?;
        Ok(rows.into_iter().filter_map(row_to_hit).collect())
    }

    /// Nearest chunks by cosine distance to the query embedding,
    /// ordered by increasing distance.
    pub async fn nearest_chunks(&self, embedding: &[f32], limit: usize) -> Result<Vec<ChunkHit>> {
        let embedding_str = format!(
            "[{}]",
            embedding
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        let sql = r#"
            SELECT
                c.id as chunk_id,
                c.decision_id,
                d.case_number,
                c.content,
                c.chunk_index
            FROM chunks c
            JOIN decisions d ON c.decision_id = d.id
            WHERE c.embedding IS NOT NULL
            ORDER BY c.embedding <=> $1::vector
            LIMIT $2
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![embedding_str.into(), (limit as i64).into()],
        );

        let rows = self.read_conn().query_all(stmt).await?;
        Ok(rows.into_iter().filter_map(row_to_hit).collect())
    }

    /// A page of the full chunk corpus, used to build the lexical index
    /// at startup. Stable order so pages never overlap.
    pub async fn all_chunks(&self, offset: u64, limit: u64) -> Result<Vec<ChunkHit>> {
        let sql = r#"
            SELECT
                c.id as chunk_id,
                c.decision_id,
                d.case_number,
                c.content,
                c.chunk_index
            FROM chunks c
            JOIN decisions d ON c.decision_id = d.id
            ORDER BY c.id
            LIMIT $1 OFFSET $2
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![(limit as i64).into(), (offset as i64).into()],
        );

        let rows = self.read_conn().query_all(stmt).await?;
        Ok(rows.into_iter().filter_map(row_to_hit).collect())
    }

    /// Total number of chunks in the corpus
    pub async fn count_chunks(&self) -> Result<u64> {
        ChunkEntity::find()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Ingestion path
    // ========================================================================

    /// Find a decision by the identifier of its scraped source document
    pub async fn find_decision_by_source_id(&self, source_id: &str) -> Result<Option<Decision>> {
        DecisionEntity::find()
            .filter(DecisionColumn::SourceId.eq(source_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a decision together with its embedded chunks in one
    /// transaction. Either the whole document lands or nothing does.
    pub async fn store_decision(
        &self,
        source_id: String,
        title: String,
        case_number: Option<String>,
        kind: String,
        embedding_model: &str,
        chunks: Vec<(i32, String, Vec<f32>)>,
    ) -> Result<Decision> {
        let decision_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let txn = self.write_conn().begin().await?;

        let decision = DecisionActiveModel {
            id: Set(decision_id),
            source_id: Set(source_id),
            title: Set(title),
            case_number: Set(case_number),
            kind: Set(kind),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        for (index, content, embedding) in chunks {
            // Convert Vec<f32> to pgvector string format "[1.0,2.0,...]"
            let embedding_str = format!(
                "[{}]",
                embedding
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            );

            // Raw SQL for the pgvector column type
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                INSERT INTO chunks (
                    id, decision_id, chunk_index, content, embedding,
                    embedding_model, created_at
                )
                VALUES ($1, $2, $3, $4, $5::vector, $6, NOW())
                "#,
                vec![
                    Uuid::new_v4().into(),
                    decision_id.into(),
                    index.into(),
                    content.into(),
                    embedding_str.into(),
                    embedding_model.into(),
                ],
            );

            txn.execute(stmt).await?;
        }

        txn.commit().await?;

        Ok(decision)
    }
}

fn row_to_hit(row: sea_orm::QueryResult) -> Option<ChunkHit> {
    Some(ChunkHit {
        chunk_id: row.try_get_by_index::<Uuid>(0).ok()?,
        decision_id: row.try_get_by_index::<Uuid>(1).ok()?,
        case_number: row.try_get_by_index::<Option<String>>(2).ok()?,
        content: row.try_get_by_index::<String>(3).ok()?,
        chunk_index: row.try_get_by_index::<i32>(4).ok()?,
    })
}
