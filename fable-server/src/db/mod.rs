pub mod connection;
pub mod repositories;
pub mod schema;
pub mod seed;

pub use connection::{Database, DbPool};
