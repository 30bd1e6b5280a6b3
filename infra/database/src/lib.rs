//! # Database Infrastructure
//!
//! Persistence for accounts, encrypted vault records and the durable mirror of live command
//! sessions. Consumers program against [`StorageProvider`]; two implementations ship here:
//!
//! - [`SurrealStorage`]: [SurrealDB](https://surrealdb.com) through the `any` engine
//!   (`mem://`, `rocksdb://`, `ws://`), with unique indexes enforcing every uniqueness rule.
//! - [`MemoryStorage`]: lock-protected hash maps, for tests and throwaway servers.
//!
//! ## Example
//!
//! ```rust
//! use keeper_database::{StorageError, StorageProvider, SurrealStorage};
//! use keeper_domain::config::DatabaseConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     let storage = SurrealStorage::connect(&DatabaseConfig::default()).await?;
//!     storage.create_user("alice", "3f0a...").await?;
//!     assert!(storage.exist_user("alice", "3f0a...").await?);
//!     Ok(())
//! }
//! ```

mod connection;
mod error;
mod memory;
mod provider;
mod schema;
mod surreal;

pub use connection::{Database, DatabaseBuilder};
pub use error::{StorageError, StorageErrorExt};
pub use memory::MemoryStorage;
pub use provider::{ClientRecord, StorageProvider};
pub use surreal::SurrealStorage;
