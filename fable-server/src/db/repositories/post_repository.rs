use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use fable_types::{Page, Post};

use crate::db::DbPool;

const POST_COLUMNS: &str = "p.id, p.author_id, u.username, p.title, p.content, p.category, p.created_at, p.likes, p.views";

pub struct PostRepository {
    pool: DbPool,
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        author_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
        author_username: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
        likes: row.get(7)?,
        views: row.get(8)?,
    })
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, author_id, title, content, category, created_at, likes, views)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.author_id.to_string(),
                &post.title,
                &post.content,
                &post.category,
                post.created_at.to_rfc3339(),
                post.likes,
                post.views,
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON p.author_id = u.id WHERE p.id = ?"
                ),
                [post_id.to_string()],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// Global feed: all posts, newest first
    pub fn global_page(&self, page: i64, per_page: i64) -> Result<Page<Post>> {
        let conn = self.pool.get()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts p
             JOIN users u ON p.author_id = u.id
             ORDER BY p.created_at DESC
             LIMIT ? OFFSET ?"
        ))?;
        let items = stmt
            .query_map([per_page, Page::<Post>::offset(page, per_page)], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total, page, per_page))
    }

    /// Profile feed: posts by a single author, newest first
    pub fn author_page(&self, author_id: &Uuid, page: i64, per_page: i64) -> Result<Page<Post>> {
        let conn = self.pool.get()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE author_id = ?",
            [author_id.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts p
             JOIN users u ON p.author_id = u.id
             WHERE p.author_id = ?
             ORDER BY p.created_at DESC
             LIMIT ? OFFSET ?"
        ))?;
        let items = stmt
            .query_map(
                rusqlite::params![
                    author_id.to_string(),
                    per_page,
                    Page::<Post>::offset(page, per_page)
                ],
                post_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total, page, per_page))
    }

    /// Personalized feed: posts authored by anyone the viewer follows,
    /// newest first. Inner join against the follow edge set.
    pub fn followed_page(&self, follower_id: &Uuid, page: i64, per_page: i64) -> Result<Page<Post>> {
        let conn = self.pool.get()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts p
             JOIN follows f ON f.followed_id = p.author_id
             WHERE f.follower_id = ?",
            [follower_id.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts p
             JOIN follows f ON f.followed_id = p.author_id
             JOIN users u ON p.author_id = u.id
             WHERE f.follower_id = ?
             ORDER BY p.created_at DESC
             LIMIT ? OFFSET ?"
        ))?;
        let items = stmt
            .query_map(
                rusqlite::params![
                    follower_id.to_string(),
                    per_page,
                    Page::<Post>::offset(page, per_page)
                ],
                post_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total, page, per_page))
    }

    /// Update title and content of an existing post
    pub fn update(&self, post_id: &Uuid, title: &str, content: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET title = ?, content = ? WHERE id = ?",
            (title, content, post_id.to_string()),
        )
        .context("Failed to update post")?;
        Ok(())
    }

    /// Delete a post; comments and likes cascade
    pub fn delete(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(rows)
    }

    /// Bump the view counter. Single UPDATE, atomic at the storage layer.
    pub fn increment_views(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let views = conn
            .query_row(
                "UPDATE posts SET views = views + 1 WHERE id = ? RETURNING views",
                [post_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to increment view count")?;
        Ok(views)
    }

    /// Bump the like counter. Callers must only do this for a genuinely new like.
    pub fn increment_likes(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let likes = conn
            .query_row(
                "UPDATE posts SET likes = likes + 1 WHERE id = ? RETURNING likes",
                [post_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to increment like count")?;
        Ok(likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{FollowRepository, UserRepository};
    use crate::db::Database;
    use chrono::Duration;
    use fable_types::User;

    fn setup() -> (Database, PostRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        let repo = PostRepository::new(db.pool.clone());
        (db, repo)
    }

    fn make_user(db: &Database, name: &str) -> User {
        UserRepository::new(db.pool.clone())
            .create(name, "hash")
            .expect("Failed to create user")
    }

    fn make_post(repo: &PostRepository, author: &User, title: &str, age_minutes: i64) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            author_username: author.username.clone(),
            title: title.to_string(),
            content: "once upon a time".to_string(),
            category: "Others".to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
            likes: 0,
            views: 0,
        };
        repo.create(&post).expect("Failed to create post");
        post
    }

    #[test]
    fn test_global_feed_newest_first_and_paged() {
        let (db, repo) = setup();
        let alice = make_user(&db, "alice");
        for i in 0..7 {
            make_post(&repo, &alice, &format!("story {i}"), i);
        }

        let page1 = repo.global_page(1, 5).expect("Query failed");
        assert_eq!(page1.total, 7);
        assert_eq!(page1.pages, 2);
        assert_eq!(page1.items.len(), 5);
        assert!(page1.has_next);
        // story 0 is the newest
        assert_eq!(page1.items[0].title, "story 0");

        let page2 = repo.global_page(2, 5).expect("Query failed");
        assert_eq!(page2.items.len(), 2);
        assert!(!page2.has_next);

        // A page past the end is empty, not an error
        let page3 = repo.global_page(3, 5).expect("Query failed");
        assert!(page3.items.is_empty());
        assert!(!page3.has_next);
    }

    #[test]
    fn test_author_feed_filters_by_author() {
        let (db, repo) = setup();
        let alice = make_user(&db, "alice");
        let bob = make_user(&db, "bob");
        make_post(&repo, &alice, "hers", 1);
        make_post(&repo, &bob, "his", 2);

        let page = repo.author_page(&alice.id, 1, 5).expect("Query failed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "hers");
        assert_eq!(page.items[0].author_username, "alice");
    }

    #[test]
    fn test_followed_feed_joins_edge_set() {
        let (db, repo) = setup();
        let alice = make_user(&db, "alice");
        let bob = make_user(&db, "bob");
        let carol = make_user(&db, "carol");
        make_post(&repo, &bob, "bob story", 1);
        make_post(&repo, &carol, "carol story", 2);
        make_post(&repo, &alice, "own story", 3);

        let follows = FollowRepository::new(db.pool.clone());
        follows.follow(&alice.id, &bob.id).expect("Failed to follow");

        let feed = repo.followed_page(&alice.id, 1, 5).expect("Query failed");
        assert_eq!(feed.total, 1);
        assert_eq!(feed.items[0].title, "bob story");
    }

    #[test]
    fn test_view_counter_increments_by_one() {
        let (db, repo) = setup();
        let alice = make_user(&db, "alice");
        let post = make_post(&repo, &alice, "hello", 0);

        assert_eq!(repo.increment_views(&post.id).expect("bump failed"), 1);
        assert_eq!(repo.increment_views(&post.id).expect("bump failed"), 2);

        let stored = repo.get_by_id(&post.id).expect("Query failed").unwrap();
        assert_eq!(stored.views, 2);
    }
}
