//! SeaORM entity models
//!
//! Database entities for the decision corpus

mod chunk;
mod decision;

pub use decision::{
    ActiveModel as DecisionActiveModel, Column as DecisionColumn, Entity as DecisionEntity,
    Model as Decision,
};

pub use chunk::{
    ActiveModel as ChunkActiveModel, Column as ChunkColumn, Entity as ChunkEntity, Model as Chunk,
};
