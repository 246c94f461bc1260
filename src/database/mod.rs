//! Database module
//!
//! This module handles database connections and the entity store contracts

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabasePool, PoolConfig};
pub use memory::MemoryStore;
pub use repositories::{EventRepository, ParticipantRepository, UserRepository};
pub use service::DatabaseService;
pub use store::{EventStore, ParticipantStore, UserStore};
