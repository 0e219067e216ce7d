pub mod connection;
pub mod fixtures;
pub mod memory;
pub mod migrations;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::SeedResult;
pub use memory::InMemoryOfferIndex;
pub use store::{RepositoryError, SqlOfferStore};
