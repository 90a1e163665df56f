use async_trait::async_trait;

use super::Database;
use super::PostStore;
use crate::models::Post;
use crate::models::PostRow;
use crate::Result;

const RECENT_GLOBAL_POSTS_SQL: &str = r"
    SELECT
        p.id,
        COALESCE(p.title, '') AS title,
        COALESCE(p.content, '') AS content,
        p.author_id,
        pr.display_name AS author_name,
        p.category,
        p.created_at,
        COALESCE(p.likes_count, 0)::BIGINT AS likes_count,
        COALESCE(p.comments_count, 0)::BIGINT AS comments_count,
        p.community_id
    FROM posts p
    LEFT JOIN profiles pr ON pr.id = p.author_id
    WHERE p.community_id IS NULL
    ORDER BY p.created_at DESC
    LIMIT $1
";

impl Database {
    /// List the newest posts on the global timeline
    pub async fn list_recent_global_posts(&self, limit: usize) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(RECENT_GLOBAL_POSTS_SQL)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Fetched {} global posts (limit {})", rows.len(), limit);
        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Count posts visible on the global timeline
    pub async fn count_global_posts(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE community_id IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl PostStore for Database {
    async fn recent_global_posts(&self, limit: usize) -> Result<Vec<Post>> {
        self.list_recent_global_posts(limit).await
    }
}
