use std::collections::HashMap;
use std::collections::VecDeque;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::render::resource::{CoverResource, TileResource};
use crate::surface::DrawSurface;

/// Bounded mapping from tile index to its live render resource.
///
/// At most `capacity` tiles hold GPU textures at any time; inserting into
/// a full cache evicts the least recently used entry first and releases its
/// texture through the surface right there. Eviction and `clear` are the
/// only paths that destroy a resource — lookups never do.
#[derive(Debug)]
pub struct TileCache {
    capacity: usize,
    entries: HashMap<usize, CoverResource>,
    // Recency order, oldest at the front.
    order: VecDeque<usize>,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// Look up a tile's resource, refreshing its recency.
    pub fn get(&mut self, index: usize) -> Option<&mut CoverResource> {
        if self.entries.contains_key(&index) {
            self.touch(index);
        }
        self.entries.get_mut(&index)
    }

    /// Insert a resource, evicting the least recently used entry if the
    /// cache is full. The evicted resource's texture is released before the
    /// new entry is admitted.
    pub fn put(&mut self, index: usize, resource: CoverResource, surface: &mut dyn DrawSurface) {
        if let Some(mut previous) = self.entries.remove(&index) {
            // Replacing in place; retire the old resource's texture.
            previous.release(surface);
            self.order.retain(|&i| i != index);
        }

        if self.entries.len() >= self.capacity {
            self.evict_one(surface);
        }

        self.entries.insert(index, resource);
        self.order.push_back(index);
    }

    /// Drop every entry, releasing all held textures first. Called when the
    /// rendering surface is resized or recreated, and when the item list is
    /// replaced.
    pub fn clear(&mut self, surface: &mut dyn DrawSurface) {
        debug!("TileCache: clearing {} entries", self.entries.len());
        for (_, mut resource) in self.entries.drain() {
            resource.release(surface);
        }
        self.order.clear();
    }

    fn evict_one(&mut self, surface: &mut dyn DrawSurface) {
        while let Some(oldest) = self.order.pop_front() {
            if let Some(mut resource) = self.entries.remove(&oldest) {
                debug!("TileCache: evicting tile {}", oldest);
                resource.release(surface);
                return;
            }
        }
    }

    fn touch(&mut self, index: usize) {
        if let Some(pos) = self.order.iter().position(|&i| i == index) {
            self.order.remove(pos);
            self.order.push_back(index);
        }
    }
}
