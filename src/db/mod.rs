//! Database module: the gateway to the queried PostgreSQL database.
//!
//! Layout:
//! - `gateway.rs`: `QueryGateway` seam and the single-connection Postgres implementation
//! - `models.rs`: the tabular result handed to the UI
//! - `schema.rs`: schema description fed to the model

pub mod gateway;
pub mod models;
pub mod schema;

pub use gateway::{PgGateway, QueryGateway};
pub use models::ResultTable;
pub use schema::DATABASE_SCHEMA;
