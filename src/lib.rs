// Manhattan Sales Heat Map - Core Library
// Exposes the storage, query, and view layers for the server binary and tests

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod sales;
pub mod views;

// Re-export commonly used types
pub use config::{Config, DatabaseConfig, LoggingConfig, ServerConfig};
pub use db::{create_schema, RequestDb, Store};
pub use error::{ConfigError, Error, Result};
pub use routes::{router, AppState, SalesData};
pub use sales::{max_price, sales_for_year, year_range, Price, SalePoint, SaleRecord, YearRange};
pub use views::{render, Template};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
