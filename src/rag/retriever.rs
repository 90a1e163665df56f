//! Candidate fetching from the post store

use std::sync::Arc;

use tracing::debug;
use tracing::error;

use crate::database::PostStore;
use crate::models::Post;

/// Pulls the recent global timeline that the relevance filter ranks
#[derive(Clone)]
pub struct CandidateFetcher {
    store: Arc<dyn PostStore>,
}

impl CandidateFetcher {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Up to `limit` globally visible posts, newest first.
    ///
    /// Store failures are logged and yield an empty pool so the request can
    /// continue in reasoning mode.
    pub async fn fetch(&self, limit: usize) -> Vec<Post> {
        if limit == 0 {
            return Vec::new();
        }

        match self.store.recent_global_posts(limit).await {
            Ok(mut posts) => {
                posts.retain(Post::is_global);
                posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                posts.truncate(limit);
                debug!("Fetched {} candidate posts", posts.len());
                posts
            }
            Err(e) => {
                error!("Failed to fetch candidate posts, continuing without them: {}", e);
                Vec::new()
            }
        }
    }
}
