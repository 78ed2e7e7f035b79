//! Bounded LRU cache for contact photos
//!
//! The presentation layer loads photo bytes from wherever it renders them;
//! this cache only bounds how many stay resident. Eviction is strict
//! least-recently-used, so behavior under pressure is deterministic rather
//! than left to the allocator's mood.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub struct PhotoCache {
    capacity: usize,
    photos: HashMap<i64, Arc<Vec<u8>>>,
    // Front is least recently used
    order: VecDeque<i64>,
}

impl PhotoCache {
    /// A capacity of zero disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            photos: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Fetch a photo and mark it most recently used.
    pub fn get(&mut self, contact_id: i64) -> Option<Arc<Vec<u8>>> {
        let photo = self.photos.get(&contact_id).cloned()?;
        self.touch(contact_id);
        Some(photo)
    }

    /// Insert or replace a photo, evicting the least recently used entry when
    /// over capacity.
    pub fn put(&mut self, contact_id: i64, bytes: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }

        if self.photos.insert(contact_id, Arc::new(bytes)).is_some() {
            self.touch(contact_id);
            return;
        }

        self.order.push_back(contact_id);
        if self.photos.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.photos.remove(&evicted);
            }
        }
    }

    pub fn contains(&self, contact_id: i64) -> bool {
        self.photos.contains_key(&contact_id)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.photos.clear();
        self.order.clear();
    }

    fn touch(&mut self, contact_id: i64) {
        if let Some(pos) = self.order.iter().position(|id| *id == contact_id) {
            self.order.remove(pos);
        }
        self.order.push_back(contact_id);
    }
}
