//! Entity rows and their field tables.
//!
//! Each model derives `FromRow` for reads and serializes as camelCase JSON.
//! `id`, `createdAt` and `updatedAt` may be omitted by clients: the service
//! assigns the id and storage maintains the timestamps.

pub mod price_list;
pub mod price_list_version_component;
pub mod transaction;

pub use price_list::PriceList;
pub use price_list_version_component::PriceListVersionComponent;
pub use transaction::Transaction;
