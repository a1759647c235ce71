use hashfeed_core::Post;
use std::collections::HashSet;
use tracing::debug;

/// The engine-owned ordered sequence of retained posts, descending by id.
///
/// Merges trust that batches arrive pre-bounded (since_id / max_id keep
/// ranges disjoint) so the whole sequence is never re-sorted; each batch is
/// sorted on its own and deduplicated against ids already retained, which
/// also absorbs an inclusive-boundary echo from the API.
#[derive(Debug, Default)]
pub struct Timeline {
    posts: Vec<Post>,
    ids: HashSet<u64>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn newest_id(&self) -> Option<u64> {
        self.posts.first().map(|p| p.id)
    }

    pub fn oldest_id(&self) -> Option<u64> {
        self.posts.last().map(|p| p.id)
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn snapshot(&self) -> Vec<Post> {
        self.posts.clone()
    }

    pub fn clear(&mut self) {
        self.posts.clear();
        self.ids.clear();
    }

    /// Discard everything and install an initial batch.
    pub fn replace(&mut self, batch: Vec<Post>) -> usize {
        self.clear();
        self.append_older(batch)
    }

    /// Merge an older page at the tail. Returns how many posts were added.
    pub fn append_older(&mut self, batch: Vec<Post>) -> usize {
        let fresh = self.normalize(batch);
        let added = fresh.len();
        self.posts.extend(fresh);
        debug!(added, total = self.posts.len(), "appended older posts");
        added
    }

    /// Merge a newer batch at the head. Returns how many posts were added.
    pub fn prepend_newer(&mut self, batch: Vec<Post>) -> usize {
        let fresh = self.normalize(batch);
        let added = fresh.len();
        self.posts.splice(0..0, fresh);
        debug!(added, total = self.posts.len(), "prepended newer posts");
        added
    }

    /// Reinstall a persisted snapshot sequence.
    pub fn restore(&mut self, posts: Vec<Post>) {
        self.clear();
        self.append_older(posts);
    }

    /// Sort a batch newest-first and drop ids already retained, keeping one
    /// occurrence of any id duplicated inside the batch itself.
    fn normalize(&mut self, batch: Vec<Post>) -> Vec<Post> {
        let mut batch = batch;
        batch.sort_unstable();
        batch
            .into_iter()
            .filter(|post| self.ids.insert(post.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64) -> Post {
        Post {
            id,
            author_name: String::new(),
            author_handle: String::new(),
            body: String::new(),
            created_at: String::new(),
            image_url: String::new(),
            retweet_count: String::new(),
            favorite_count: String::new(),
        }
    }

    fn ids(timeline: &Timeline) -> Vec<u64> {
        timeline.posts().iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_replace_sorts_descending() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![post(90), post(100)]);
        assert_eq!(ids(&timeline), vec![100, 90]);
        assert_eq!(timeline.newest_id(), Some(100));
        assert_eq!(timeline.oldest_id(), Some(90));
    }

    #[test]
    fn test_append_older_keeps_junction_ordered() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![post(100), post(90)]);
        timeline.append_older(vec![post(70), post(80)]);
        assert_eq!(ids(&timeline), vec![100, 90, 80, 70]);
        // Junction invariant: old tail >= new tail head.
        assert!(timeline.posts()[1].id >= timeline.posts()[2].id);
    }

    #[test]
    fn test_prepend_newer_keeps_junction_ordered() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![post(100), post(90)]);
        let added = timeline.prepend_newer(vec![post(110), post(120)]);
        assert_eq!(added, 2);
        assert_eq!(ids(&timeline), vec![120, 110, 100, 90]);
    }

    #[test]
    fn test_merge_deduplicates_boundary_echo() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![post(100), post(90)]);
        let added = timeline.append_older(vec![post(90), post(80)]);
        assert_eq!(added, 1);
        assert_eq!(ids(&timeline), vec![100, 90, 80]);
    }

    #[test]
    fn test_duplicate_inside_batch_kept_once() {
        let mut timeline = Timeline::new();
        let added = timeline.replace(vec![post(100), post(100), post(90)]);
        assert_eq!(added, 2);
        assert_eq!(ids(&timeline), vec![100, 90]);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut timeline = Timeline::new();
        timeline.replace(vec![post(100), post(90)]);
        let saved = timeline.snapshot();

        let mut restored = Timeline::new();
        restored.restore(saved);
        assert_eq!(ids(&restored), vec![100, 90]);
    }
}
