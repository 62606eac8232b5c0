use rand::thread_rng;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::models::{ShoppingItem, StoreRecommendation};
use crate::service::category::guess_category;
use crate::service::recommender::StoreCatalog;
use crate::service::sessions::SessionMap;

/// A user's shopping list
#[derive(Debug, Clone, Default)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; the category is guessed and quantity is at least 1
    pub fn add(&mut self, name: &str, quantity: u32) -> &ShoppingItem {
        let name = name.trim().to_string();
        let item = ShoppingItem {
            id: Uuid::new_v4(),
            category: guess_category(&name),
            name,
            quantity: quantity.max(1),
            completed: false,
        };
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// Flip completion; returns the new state, None for unknown ids
    pub fn toggle(&mut self, id: Uuid) -> Option<bool> {
        let item = self.items.iter_mut().find(|i| i.id == id)?;
        item.completed = !item.completed;
        Some(item.completed)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<ShoppingItem> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(idx))
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn active_items(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.items.iter().filter(|i| !i.completed)
    }
}

/// Per-session shopping lists plus the pricing catalog
pub struct ShoppingService {
    catalog: StoreCatalog,
    lists: SessionMap<ShoppingList>,
}

impl ShoppingService {
    pub fn new(catalog: StoreCatalog) -> Self {
        Self {
            catalog,
            lists: SessionMap::new(),
        }
    }

    pub fn add_item(&self, session_id: Uuid, name: &str, quantity: u32) -> ShoppingItem {
        let item = self
            .lists
            .update_or_insert_with(session_id, ShoppingList::new, |list| list.add(name, quantity).clone());
        tracing::debug!("session {}: added {} ({})", session_id, item.name, item.category);
        item
    }

    pub fn toggle_item(&self, session_id: Uuid, item_id: Uuid) -> Option<bool> {
        self.lists.update(session_id, |list| list.toggle(item_id))?
    }

    pub fn remove_item(&self, session_id: Uuid, item_id: Uuid) -> Option<ShoppingItem> {
        self.lists.update(session_id, |list| list.remove(item_id))?
    }

    pub fn items(&self, session_id: Uuid) -> Vec<ShoppingItem> {
        self.lists
            .read(session_id, |list| list.items().to_vec())
            .unwrap_or_default()
    }

    /// Recomputed on every call from the current item set
    pub fn recommendations_for(&self, items: &[ShoppingItem]) -> Vec<StoreRecommendation> {
        self.catalog.recommend(items, &mut thread_rng())
    }

    pub fn session_recommendations(&self, session_id: Uuid) -> Vec<StoreRecommendation> {
        let items = self.items(session_id);
        self.recommendations_for(&items)
    }

    /// Drop lists of sessions idle longer than `idle`
    pub fn prune_idle_sessions(&self, now: Instant, idle: Duration) -> usize {
        self.lists.prune_idle(now, idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn add_guesses_category_and_clamps_quantity() {
        let mut list = ShoppingList::new();
        let item = list.add("  whole milk ", 0).clone();
        assert_eq!(item.name, "whole milk");
        assert_eq!(item.category, Category::Dairy);
        assert_eq!(item.quantity, 1);
        assert!(!item.completed);
    }

    #[test]
    fn toggle_and_remove() {
        let mut list = ShoppingList::new();
        let eggs = list.add("eggs", 12).id;
        let bread = list.add("bread", 1).id;

        assert_eq!(list.toggle(eggs), Some(true));
        assert_eq!(list.active_items().count(), 1);
        assert_eq!(list.toggle(eggs), Some(false));

        assert!(list.remove(bread).is_some());
        assert!(list.remove(bread).is_none());
        assert_eq!(list.toggle(Uuid::new_v4()), None);
        assert_eq!(list.items().len(), 1);
    }

    #[test]
    fn session_recommendations_follow_the_list() {
        let service = ShoppingService::new(StoreCatalog::mock());
        let session = Uuid::new_v4();
        assert!(service.session_recommendations(session).is_empty());

        let milk = service.add_item(session, "milk", 2);
        assert_eq!(service.session_recommendations(session).len(), 4);

        service.toggle_item(session, milk.id);
        assert!(service.session_recommendations(session).is_empty());
    }

    #[test]
    fn idle_lists_expire() {
        let service = ShoppingService::new(StoreCatalog::mock());
        let session = Uuid::new_v4();
        service.add_item(session, "bread", 1);

        let idle = Duration::from_secs(3600);
        assert_eq!(service.prune_idle_sessions(Instant::now(), idle), 0);
        assert_eq!(service.items(session).len(), 1);

        let later = Instant::now() + Duration::from_secs(3601);
        assert_eq!(service.prune_idle_sessions(later, idle), 1);
        assert!(service.items(session).is_empty());
    }
}
