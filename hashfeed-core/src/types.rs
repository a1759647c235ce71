use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// One fetched post. Immutable once it enters a timeline.
///
/// `id` is the sole identity and ordering key: ids grow with recency, so a
/// larger id means a newer post. The count fields are display strings
/// straight from the wire and are not guaranteed to be numeric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author_name: String,
    pub author_handle: String,
    pub body: String,
    pub created_at: String,
    pub image_url: String,
    pub retweet_count: String,
    pub favorite_count: String,
}

impl Post {
    /// Handle as rendered, with the `@` prefix. Stored without it.
    pub fn display_handle(&self) -> String {
        format!("@{}", self.author_handle)
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Post {}

impl Hash for Post {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Ord for Post {
    /// Newest first: a post with a larger id sorts before a smaller one.
    fn cmp(&self, other: &Self) -> Ordering {
        other.id.cmp(&self.id)
    }
}

impl PartialOrd for Post {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A decoded RGBA8 image. The accounted cost of a cache entry is the pixel
/// footprint (`width * height * 4`), not the encoded transfer size.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

/// Everything the presentation layer serializes on suspension: the retained
/// timeline, the active query, and whether polling was running. Feeding it
/// back through `FeedEngine::restore` resumes without a fresh fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub query: String,
    pub posts: Vec<Post>,
    pub polling: bool,
}
