use hashfeed_core::DecodedImage;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// 10 MiB of decoded pixels.
pub const DEFAULT_CAPACITY_BYTES: usize = 10 * 1024 * 1024;

/// Host memory-pressure tiers. Critical evicts everything, Moderate evicts
/// roughly half of current occupancy by accounted size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    Moderate,
    Critical,
}

#[derive(Debug)]
struct CacheEntry {
    image: Arc<DecodedImage>,
    bytes: usize,
}

/// Bounded LRU store mapping post id to its decoded avatar.
///
/// Cost is the decoded pixel footprint, so the capacity bound tracks actual
/// memory pressure rather than transfer size. Not internally synchronized;
/// the engine serializes access through its own lock.
#[derive(Debug)]
pub struct ImageCache {
    entries: HashMap<u64, CacheEntry>,
    /// Recency list: front = most recently used, back = least.
    order: VecDeque<u64>,
    total_bytes: usize,
    capacity_bytes: usize,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }

    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            total_bytes: 0,
            capacity_bytes,
        }
    }

    /// Lookup by post id, promoting the entry to most-recently-used.
    pub fn get(&mut self, id: u64) -> Option<Arc<DecodedImage>> {
        if !self.entries.contains_key(&id) {
            return None;
        }
        self.touch(id);
        self.entries.get(&id).map(|entry| Arc::clone(&entry.image))
    }

    /// Insert, evicting least-recently-used entries until the total
    /// accounted size fits the capacity again.
    pub fn put(&mut self, id: u64, image: DecodedImage) {
        let bytes = image.byte_size();
        if let Some(previous) = self.entries.remove(&id) {
            self.total_bytes -= previous.bytes;
            self.order.retain(|k| *k != id);
        }

        self.entries.insert(
            id,
            CacheEntry {
                image: Arc::new(image),
                bytes,
            },
        );
        self.order.push_front(id);
        self.total_bytes += bytes;
        self.trim_to(self.capacity_bytes);
    }

    pub fn evict_all(&mut self) {
        debug!(evicted = self.entries.len(), "evicting entire image cache");
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }

    /// Drop least-recently-used entries until the accounted size is at most
    /// half of what it was.
    pub fn evict_half(&mut self) {
        self.trim_to(self.total_bytes / 2);
    }

    pub fn handle_memory_pressure(&mut self, level: MemoryPressure) {
        match level {
            MemoryPressure::Critical => self.evict_all(),
            MemoryPressure::Moderate => self.evict_half(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    fn touch(&mut self, id: u64) {
        self.order.retain(|k| *k != id);
        self.order.push_front(id);
    }

    fn trim_to(&mut self, target_bytes: usize) {
        while self.total_bytes > target_bytes {
            let Some(oldest) = self.order.pop_back() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.total_bytes -= entry.bytes;
                debug!(id = oldest, bytes = entry.bytes, "evicted cached avatar");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_of(bytes: usize) -> DecodedImage {
        // 4 bytes per pixel; callers pass multiples of 4.
        DecodedImage {
            width: (bytes / 4) as u32,
            height: 1,
            pixels: vec![0u8; bytes],
        }
    }

    #[test]
    fn test_capacity_bound_evicts_lru_first() {
        let mut cache = ImageCache::with_capacity(100);
        cache.put(1, image_of(40));
        cache.put(2, image_of(40));
        cache.put(3, image_of(40));

        // 1 was least recently used and must be gone.
        assert_eq!(cache.len(), 2);
        assert!(cache.total_bytes() <= 100);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn test_get_promotes_recency() {
        let mut cache = ImageCache::with_capacity(100);
        cache.put(1, image_of(40));
        cache.put(2, image_of(40));

        // Promote 1, then overflow: 2 must be the victim.
        assert!(cache.get(1).is_some());
        cache.put(3, image_of(40));

        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn test_replacing_entry_adjusts_accounting() {
        let mut cache = ImageCache::with_capacity(100);
        cache.put(1, image_of(40));
        cache.put(1, image_of(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_bytes(), 60);
    }

    #[test]
    fn test_evict_all() {
        let mut cache = ImageCache::with_capacity(100);
        cache.put(1, image_of(40));
        cache.put(2, image_of(40));
        cache.evict_all();
        assert!(cache.is_empty());
        assert_eq!(cache.total_bytes(), 0);
    }

    #[test]
    fn test_evict_half_drops_lru_end() {
        let mut cache = ImageCache::with_capacity(1000);
        cache.put(1, image_of(100));
        cache.put(2, image_of(100));
        cache.put(3, image_of(100));
        cache.put(4, image_of(100));

        let before = cache.total_bytes();
        cache.evict_half();
        assert!(cache.total_bytes() <= before / 2);
        // Oldest first: 1 and 2 are gone, 3 and 4 remain.
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_none());
        assert!(cache.get(3).is_some());
        assert!(cache.get(4).is_some());
    }

    #[test]
    fn test_memory_pressure_tiers() {
        let mut cache = ImageCache::with_capacity(1000);
        cache.put(1, image_of(100));
        cache.put(2, image_of(100));

        cache.handle_memory_pressure(MemoryPressure::Moderate);
        assert_eq!(cache.total_bytes(), 100);

        cache.handle_memory_pressure(MemoryPressure::Critical);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oversized_entry_does_not_break_accounting() {
        let mut cache = ImageCache::with_capacity(50);
        cache.put(1, image_of(80));
        assert!(cache.is_empty());
        assert_eq!(cache.total_bytes(), 0);
    }
}
