use anyhow::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Item, ItemRepository, ItemRepositoryPtr, NewItem};

/// Creates the default, process-local item store.
pub fn create_memory_repository() -> ItemRepositoryPtr {
    // ---
    Arc::new(MemoryRepository::new())
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    items: BTreeMap<i64, Item>,
}

/// Item store kept in memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryRepository {
    // ---
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    // ---
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ItemRepository for MemoryRepository {
    // ---
    async fn list_items(&self) -> Result<Vec<Item>> {
        // ---
        Ok(self.state.lock().items.values().cloned().collect())
    }

    async fn create_item(&self, item: NewItem) -> Result<Item> {
        // ---
        let mut state = self.state.lock();
        state.last_id += 1;
        let item = Item::from_new(state.last_id, item);
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        // ---
        Ok(self.state.lock().items.get(&id).cloned())
    }

    async fn update_item(&self, id: i64, item: NewItem) -> Result<Option<Item>> {
        // ---
        let mut state = self.state.lock();
        let Some(existing) = state.items.get_mut(&id) else {
            return Ok(None);
        };

        existing.name = item.name;
        existing.description = item.description;
        existing.price = item.price;
        Ok(Some(existing.clone()))
    }

    async fn delete_item(&self, id: i64) -> Result<bool> {
        // ---
        Ok(self.state.lock().items.remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn widget(name: &str, price: f64) -> NewItem {
        // ---
        NewItem {
            name: name.to_string(),
            description: None,
            price,
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() -> Result<()> {
        // ---
        let repo = MemoryRepository::new();
        let first = repo.create_item(widget("first", 1.0)).await?;
        let second = repo.create_item(widget("second", 2.5)).await?;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let all = repo.list_items().await?;
        assert_eq!(all, vec![first, second]);
        Ok(())
    }

    #[tokio::test]
    async fn update_keeps_id_and_creation_time() -> Result<()> {
        // ---
        let repo = MemoryRepository::new();
        let created = repo.create_item(widget("lamp", 10.0)).await?;

        let mut replacement = widget("desk lamp", 12.0);
        replacement.description = Some("brass".to_string());
        let updated = repo
            .update_item(created.id, replacement)
            .await?
            .expect("item exists");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, "desk lamp");
        assert_eq!(updated.description.as_deref(), Some("brass"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_items_are_reported() -> Result<()> {
        // ---
        let repo = MemoryRepository::new();

        assert!(repo.get_item(42).await?.is_none());
        assert!(repo.update_item(42, widget("ghost", 0.0)).await?.is_none());
        assert!(!repo.delete_item(42).await?);
        Ok(())
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() -> Result<()> {
        // ---
        let repo = MemoryRepository::new();
        let first = repo.create_item(widget("a", 1.0)).await?;
        assert!(repo.delete_item(first.id).await?);

        let second = repo.create_item(widget("b", 1.0)).await?;
        assert_eq!(second.id, 2);
        assert!(repo.get_item(first.id).await?.is_none());
        Ok(())
    }
}
