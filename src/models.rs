use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Post category as stored in the `posts.category` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    Question,
    Diary,
    Chat,
    Normal,
}

impl PostCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Diary => "diary",
            Self::Chat => "chat",
            Self::Normal => "normal",
        }
    }

    /// Japanese label used in prompts
    pub const fn label(self) -> &'static str {
        match self {
            Self::Question => "質問",
            Self::Diary => "日記",
            Self::Chat => "雑談",
            Self::Normal => "通常",
        }
    }
}

impl FromStr for PostCategory {
    type Err = std::convert::Infallible;

    /// Unknown or legacy values are treated as normal posts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "question" => Self::Question,
            "diary" => Self::Diary,
            "chat" => Self::Chat,
            _ => Self::Normal,
        })
    }
}

impl fmt::Display for PostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape returned by the candidate query (posts joined with author profiles)
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub community_id: Option<Uuid>,
}

/// A post as seen by the search pipeline. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub category: PostCategory,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    /// `None` means the post is visible on the global timeline
    pub community_id: Option<Uuid>,
}

/// Shown when the author has no profile name
pub const ANONYMOUS_AUTHOR: &str = "匿名ユーザー";

impl Post {
    pub fn author_display_name(&self) -> &str {
        self.author_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
    }

    pub fn is_global(&self) -> bool {
        self.community_id.is_none()
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let category = row
            .category
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(PostCategory::Normal);

        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            author_name: row.author_name,
            category,
            created_at: row.created_at,
            likes_count: row.likes_count.max(0),
            comments_count: row.comments_count.max(0),
            community_id: row.community_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: Option<&str>, author_name: Option<&str>) -> PostRow {
        PostRow {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            content: "c".to_string(),
            author_id: Uuid::new_v4(),
            author_name: author_name.map(str::to_string),
            category: category.map(str::to_string),
            created_at: Utc::now(),
            likes_count: -3,
            comments_count: 2,
            community_id: None,
        }
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("question".parse::<PostCategory>().unwrap(), PostCategory::Question);
        assert_eq!("Diary".parse::<PostCategory>().unwrap(), PostCategory::Diary);
        assert_eq!(" chat ".parse::<PostCategory>().unwrap(), PostCategory::Chat);
        assert_eq!("poll".parse::<PostCategory>().unwrap(), PostCategory::Normal);
    }

    #[test]
    fn test_row_conversion_defaults() {
        let post = Post::from(row(None, None));
        assert_eq!(post.category, PostCategory::Normal);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 2);
        assert!(post.is_global());
    }

    #[test]
    fn test_author_display_name_fallback() {
        assert_eq!(Post::from(row(None, Some("Bob"))).author_display_name(), "Bob");
        assert_eq!(
            Post::from(row(None, Some("  "))).author_display_name(),
            ANONYMOUS_AUTHOR
        );
        assert_eq!(Post::from(row(None, None)).author_display_name(), ANONYMOUS_AUTHOR);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&PostCategory::Question).unwrap();
        assert_eq!(json, "\"question\"");
    }
}
