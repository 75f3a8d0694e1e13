//! Entity services: validation and orchestration between handlers and repositories.

pub mod entity_service;

pub use entity_service::EntityService;
