use super::Database;
use crate::Result;

/// Tables the search pipeline reads. Production databases are managed elsewhere;
/// this exists so a local development database can be brought up with `postrag init`.
const SCHEMA_STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS profiles (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        display_name TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS communities (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS posts (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        author_id UUID NOT NULL REFERENCES profiles(id),
        category TEXT NOT NULL DEFAULT 'normal',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        likes_count INTEGER NOT NULL DEFAULT 0,
        comments_count INTEGER NOT NULL DEFAULT 0,
        community_id UUID REFERENCES communities(id)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_posts_global_created_at
        ON posts (created_at DESC)
        WHERE community_id IS NULL
    ",
];

impl Database {
    /// Create the tables read by the search pipeline if they are missing
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema initialized");
        Ok(())
    }

    /// Returns true if the `posts` table exists
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public'
                AND table_name = 'posts'
            )
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            tracing::debug!("Missing required table: posts");
        }
        Ok(exists)
    }
}
