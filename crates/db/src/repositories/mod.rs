//! Repository layer.
//!
//! Repositories are zero-sized structs providing async CRUD methods. The
//! single-row operations accept any Postgres executor so they can run inside
//! a transaction as well as directly on the pool.

pub mod entity_repo;

pub use entity_repo::EntityRepo;
