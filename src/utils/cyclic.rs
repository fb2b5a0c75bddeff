//! Modular-index wrapper over a fixed sequence
//!
//! Per-target parameters (extra counts, denominators, prefix counts,
//! interpolations) repeat cyclically; `Cyclic` answers `element_at(i)` as
//! `items[i mod len]` for any signed `i`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cyclic<T> {
    items: Vec<T>,
}

impl<T: Clone> Cyclic<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Wrap `items`, or `fallback` when `items` is empty
    pub fn or_default_items(items: Vec<T>, fallback: Vec<T>) -> Self {
        if items.is_empty() {
            Self::new(fallback)
        } else {
            Self::new(items)
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    fn wrap(&self, index: i64) -> usize {
        index.rem_euclid(self.items.len() as i64) as usize
    }

    /// Element at `index` mod length; `None` only when empty
    pub fn get(&self, index: i64) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get(self.wrap(index))
    }

    /// Elements `start..stop` of the infinite cycle
    pub fn slice(&self, start: i64, stop: i64) -> Vec<T> {
        if self.items.is_empty() {
            return Vec::new();
        }
        (start..stop)
            .map(|i| self.items[self.wrap(i)].clone())
            .collect()
    }

    /// Cycle that starts at element `offset` of this one
    pub fn advanced(&self, offset: i64) -> Self {
        if self.items.is_empty() {
            return self.clone();
        }
        let len = self.items.len() as i64;
        Self::new(self.slice(offset, offset + len))
    }
}
