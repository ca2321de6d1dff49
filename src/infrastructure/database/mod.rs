mod memory_repository;
mod postgres_repository;

pub use memory_repository::{create_memory_repository, MemoryRepository};
pub use postgres_repository::{connect_postgres, create_postgres_repository, PostgresRepository};
