use super::item_models::{Item, NewItem};
use anyhow::Result;
use std::sync::Arc;

/// Abstraction for item persistence.
#[async_trait::async_trait]
pub trait ItemRepository: Send + Sync {
    // ---
    /// List all items ordered by id.
    async fn list_items(&self) -> Result<Vec<Item>>;

    /// Store a new item and return it with its assigned id.
    async fn create_item(&self, item: NewItem) -> Result<Item>;

    /// Get an item by id.
    async fn get_item(&self, id: i64) -> Result<Option<Item>>;

    /// Replace the fields of an existing item. Returns `None` if it does not exist.
    async fn update_item(&self, id: i64, item: NewItem) -> Result<Option<Item>>;

    /// Delete an item. Returns `false` if it did not exist.
    async fn delete_item(&self, id: i64) -> Result<bool>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// Type alias for any backend that implements ItemRepository.
pub type ItemRepositoryPtr = Arc<dyn ItemRepository>;
