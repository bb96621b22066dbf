mod database;
mod state_builder;

pub use database::connect_and_migrate;
pub use state_builder::{MemoryStores, build_memory_state, build_postgres_state};
