//! # Repositories
//!
//! Persistence contracts plus two adapters: an in-memory store for tests and
//! embedded runs, and a Postgres store backed by `sqlx`.

pub mod errors;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use errors::{PersistenceError, PersistenceResult};
pub use memory::InMemoryRepository;
pub use postgres::PgRepository;
pub use traits::{
    PolicyFilter, PolicyRepository, ResourceFilter, ResourceRepository, ScanFilter,
    ScanRepository,
};
