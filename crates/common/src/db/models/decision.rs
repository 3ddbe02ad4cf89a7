//! Tribunal decision entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "decisions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Identifier of the scraped source document
    #[sea_orm(column_type = "Text", unique)]
    pub source_id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// Structured case identifier extracted from the document head.
    /// Absent when the head carries no recognizable number.
    #[sea_orm(column_type = "Text", nullable)]
    pub case_number: Option<String>,

    /// გადაწყვეტილება (decision) or ბრძანება (order)
    #[sea_orm(column_type = "Text")]
    pub kind: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chunk::Entity")]
    Chunks,
}

impl Related<super::chunk::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chunks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
