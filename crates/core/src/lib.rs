//! Domain building blocks shared by the database and API crates.
//!
//! Nothing in here touches the network or the database: entity field tables,
//! the filter/sort/paginate query plan, patch documents, entitlements and the
//! core error type.

pub mod entitlement;
pub mod error;
pub mod field;
pub mod filter;
pub mod patch;
pub mod query;
pub mod types;

#[cfg(test)]
mod testing;
