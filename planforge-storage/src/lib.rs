//! Planforge Storage - Project Store and Transactional Persistence
//!
//! Defines the store abstraction and its two backends (in-memory and
//! PostgreSQL), plus the components built on top of it: project lookups,
//! the activity audit log and the coordinator that persists and links a
//! generated floor plan in one unit of work.

pub mod audit;
pub mod coordinator;
pub mod document;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

pub use audit::ActivityAuditLog;
pub use coordinator::{verify_link, TransactionCoordinator};
pub use document::ProjectDocument;
pub use memory::{Fault, InMemoryStore};
pub use postgres::{DbConfig, PgStore};
pub use repository::ProjectRepository;
pub use store::{DocumentStore, LinkOutcome, StoreSession};
