use std::collections::VecDeque;
use std::sync::Arc;

use crate::products::ProductType;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Product types picked during one session, most recent first.
///
/// Owned by the caller; nothing here is global or persisted.
#[derive(Debug, Clone)]
pub struct RecentProducts {
    capacity: usize,
    items: VecDeque<Arc<ProductType>>,
}

impl Default for RecentProducts {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENT_LIMIT)
    }
}

impl RecentProducts {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Puts `product_type` in front. An entry with the same name moves
    /// instead of being duplicated; the oldest entry is evicted when full.
    pub fn push(&mut self, product_type: Arc<ProductType>) {
        self.items.retain(|existing| existing.name != product_type.name);
        self.items.push_front(product_type);
        self.items.truncate(self.capacity);
    }

    /// Entry at `index`, counting from the most recent.
    pub fn get(&self, index: usize) -> Option<Arc<ProductType>> {
        self.items.get(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProductType>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
