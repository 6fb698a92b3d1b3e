//! Errors surfaced by catalog operations.

use super::models::{EntityId, EntityKind};
use super::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn not_found(kind: EntityKind, id: EntityId) -> Self {
        CatalogError::NotFound { kind, id }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Storage(err.into())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
