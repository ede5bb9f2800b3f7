use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::DbPool;

/// Set of (user, post) like marks. The denormalized `posts.likes` counter
/// is maintained separately by PostRepository; callers use the bool
/// returned from `like` to decide whether to bump it.
pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record that a user likes a post. Returns false when the like was
    /// already present (liking twice is a no-op).
    pub fn like(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)",
                (
                    user_id.to_string(),
                    post_id.to_string(),
                    Utc::now().to_rfc3339(),
                ),
            )
            .context("Failed to record like")?;
        Ok(rows > 0)
    }

    /// Check whether a user has liked a post
    pub fn has_liked(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?",
            (user_id.to_string(), post_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of like rows for a post (ground truth behind the counter)
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{PostRepository, UserRepository};
    use crate::db::Database;
    use fable_types::Post;

    fn setup() -> (Database, LikeRepository, Uuid, Uuid) {
        let db = Database::in_memory().expect("Failed to create test database");
        let user = UserRepository::new(db.pool.clone())
            .create("alice", "hash")
            .expect("Failed to create user");
        let post = Post {
            id: Uuid::new_v4(),
            author_id: user.id,
            author_username: user.username.clone(),
            title: "hello".to_string(),
            content: "world".to_string(),
            category: "Others".to_string(),
            created_at: chrono::Utc::now(),
            likes: 0,
            views: 0,
        };
        PostRepository::new(db.pool.clone())
            .create(&post)
            .expect("Failed to create post");
        let repo = LikeRepository::new(db.pool.clone());
        (db, repo, user.id, post.id)
    }

    #[test]
    fn test_like_recorded_once() {
        let (_db, repo, user, post) = setup();

        assert!(!repo.has_liked(&user, &post).unwrap());
        assert!(repo.like(&user, &post).unwrap());
        assert!(repo.has_liked(&user, &post).unwrap());

        // Second like from the same user is ignored
        assert!(!repo.like(&user, &post).unwrap());
        assert_eq!(repo.count_for_post(&post).unwrap(), 1);
    }

    #[test]
    fn test_likes_cascade_with_post() {
        let (db, repo, user, post) = setup();
        repo.like(&user, &post).unwrap();

        PostRepository::new(db.pool.clone())
            .delete(&post)
            .expect("Failed to delete post");
        assert_eq!(repo.count_for_post(&post).unwrap(), 0);
    }
}
