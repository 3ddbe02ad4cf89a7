//! Chunk entity with embedding versioning

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub decision_id: Uuid,

    pub chunk_index: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// pgvector embedding stored as text for SeaORM compatibility.
    /// Actual vector operations done via raw SQL.
    #[sea_orm(column_type = "Text", nullable)]
    pub embedding: Option<String>,

    /// Embedding model identifier; queries must embed with the same model
    #[sea_orm(column_type = "Text")]
    pub embedding_model: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::decision::Entity",
        from = "Column::DecisionId",
        to = "super::decision::Column::Id",
        on_delete = "Cascade"
    )]
    Decision,
}

impl Related<super::decision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Decision.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse embedding from stored text format to Vec<f32>
    pub fn parse_embedding(&self) -> Option<Vec<f32>> {
        self.embedding.as_ref().and_then(|s| {
            // Format: "[1.0,2.0,3.0,...]"
            let inner = s.trim_start_matches('[').trim_end_matches(']');
            inner.split(',').map(|v| v.trim().parse::<f32>().ok()).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_embedding() {
        let model = Model {
            id: Uuid::new_v4(),
            decision_id: Uuid::new_v4(),
            chunk_index: 0,
            content: String::new(),
            embedding: Some("[0.1, -0.5,2]".to_string()),
            embedding_model: "test".to_string(),
            created_at: Utc::now().into(),
        };
        assert_eq!(model.parse_embedding(), Some(vec![0.1, -0.5, 2.0]));
    }

    #[test]
    fn test_parse_embedding_missing() {
        let model = Model {
            id: Uuid::new_v4(),
            decision_id: Uuid::new_v4(),
            chunk_index: 0,
            content: String::new(),
            embedding: None,
            embedding_model: "test".to_string(),
            created_at: Utc::now().into(),
        };
        assert_eq!(model.parse_embedding(), None);
    }
}
