pub mod connection;
pub mod executor;
pub mod fixtures;
pub mod migrations;
pub mod render;

pub use connection::{connect_with_settings, ping, DbPool};
pub use executor::SqlQueryExecutor;
pub use fixtures::{DemoDataset, SeedResult, VerificationResult};
pub use render::{render, RenderedQuery};
