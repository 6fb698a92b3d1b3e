mod error;
mod models;
pub mod relationships;
mod schema;
mod store;
mod trait_def;
mod validation;

pub use error::{CatalogError, CatalogResult};
pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::{SqlEntity, SqliteCatalogStore, SqliteGateway};
pub use trait_def::{require, CatalogGateway, Repository};
pub use validation::{validate_name, ValidationError, ValidationResult, MAX_NAME_LENGTH};
