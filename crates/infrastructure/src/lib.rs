//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_directory;
mod in_memory_grant_repository;
mod postgres_grant_repository;
mod postgres_resource_registry;
mod postgres_tenant_directory;

pub use in_memory_directory::{InMemoryResourceRegistry, InMemoryTenantDirectory};
pub use in_memory_grant_repository::InMemoryGrantRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use postgres_resource_registry::PostgresResourceRegistry;
pub use postgres_tenant_directory::PostgresTenantDirectory;
