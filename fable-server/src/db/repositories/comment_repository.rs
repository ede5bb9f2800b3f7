use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use fable_types::Comment;

use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
        author_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
        author_username: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get::<_, String>(5)?.parse::<DateTime<Utc>>().unwrap(),
    })
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a comment to a post
    pub fn create(&self, comment: &Comment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (id, post_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.content,
                comment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    pub fn get_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.created_at
                 FROM comments c JOIN users u ON c.author_id = u.id
                 WHERE c.id = ?",
                [comment_id.to_string()],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    /// All comments on a post, newest first
    pub fn for_post(&self, post_id: &Uuid) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.created_at
             FROM comments c JOIN users u ON c.author_id = u.id
             WHERE c.post_id = ?
             ORDER BY c.created_at DESC",
        )?;
        let comments = stmt
            .query_map([post_id.to_string()], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn count_for_post(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?",
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
    use chrono::Duration;
    use fable_types::{Post, User};

    fn setup() -> (Database, CommentRepository, User, Post) {
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
            created_at: Utc::now(),
            likes: 0,
            views: 0,
        };
        PostRepository::new(db.pool.clone())
            .create(&post)
            .expect("Failed to create post");
        let repo = CommentRepository::new(db.pool.clone());
        (db, repo, user, post)
    }

    fn make_comment(repo: &CommentRepository, user: &User, post: &Post, text: &str, age_minutes: i64) {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            author_id: user.id,
            author_username: user.username.clone(),
            content: text.to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        };
        repo.create(&comment).expect("Failed to create comment");
    }

    #[test]
    fn test_comments_listed_newest_first() {
        let (_db, repo, user, post) = setup();
        make_comment(&repo, &user, &post, "first", 2);
        make_comment(&repo, &user, &post, "second", 1);
        make_comment(&repo, &user, &post, "third", 0);

        let comments = repo.for_post(&post.id).expect("Query failed");
        let texts: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
        assert_eq!(comments[0].author_username, "alice");
    }

    #[test]
    fn test_comments_cascade_with_post() {
        let (db, repo, user, post) = setup();
        make_comment(&repo, &user, &post, "soon gone", 0);

        PostRepository::new(db.pool.clone())
            .delete(&post.id)
            .expect("Failed to delete post");
        assert_eq!(repo.count_for_post(&post.id).expect("Query failed"), 0);
    }
}
