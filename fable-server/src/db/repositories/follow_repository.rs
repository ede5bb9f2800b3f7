use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use fable_types::Page;

use crate::db::DbPool;

/// Directed follower -> followed edge set with direct existence and
/// cardinality queries.
pub struct FollowRepository {
    pool: DbPool,
}

fn uuid_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Uuid> {
    let id: String = row.get(0)?;
    Ok(Uuid::parse_str(&id).unwrap())
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if user A is following user B
    pub fn is_following(&self, follower_id: &Uuid, followed_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followed_id = ?",
            (follower_id.to_string(), followed_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert a follow edge. Returns false when the edge already existed
    /// (duplicate follows are a no-op). Self-follow must be rejected by the
    /// caller before reaching this point.
    pub fn follow(&self, follower_id: &Uuid, followed_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id, created_at) VALUES (?, ?, ?)",
                (
                    follower_id.to_string(),
                    followed_id.to_string(),
                    Utc::now().to_rfc3339(),
                ),
            )
            .context("Failed to follow user")?;
        Ok(rows > 0)
    }

    /// Remove a follow edge. Returns the number of rows removed; 0 means
    /// there was no edge and the call was a no-op.
    pub fn unfollow(&self, follower_id: &Uuid, followed_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ? AND followed_id = ?",
                (follower_id.to_string(), followed_id.to_string()),
            )
            .context("Failed to unfollow user")?;
        Ok(rows)
    }

    /// All follower ids for a user, newest edge first (fan-out input)
    pub fn followers(&self, user_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT follower_id FROM follows WHERE followed_id = ? ORDER BY created_at DESC",
        )?;
        let ids = stmt
            .query_map([user_id.to_string()], uuid_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// One page of follower ids
    pub fn followers_page(&self, user_id: &Uuid, page: i64, per_page: i64) -> Result<Page<Uuid>> {
        let conn = self.pool.get()?;
        let total = self.follower_count(user_id)? as i64;
        let mut stmt = conn.prepare(
            "SELECT follower_id FROM follows WHERE followed_id = ?
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )?;
        let ids = stmt
            .query_map(
                rusqlite::params![user_id.to_string(), per_page, Page::<Uuid>::offset(page, per_page)],
                uuid_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(ids, total, page, per_page))
    }

    /// One page of followed-user ids
    pub fn following_page(&self, user_id: &Uuid, page: i64, per_page: i64) -> Result<Page<Uuid>> {
        let conn = self.pool.get()?;
        let total = self.following_count(user_id)? as i64;
        let mut stmt = conn.prepare(
            "SELECT followed_id FROM follows WHERE follower_id = ?
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )?;
        let ids = stmt
            .query_map(
                rusqlite::params![user_id.to_string(), per_page, Page::<Uuid>::offset(page, per_page)],
                uuid_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(ids, total, page, per_page))
    }

    /// Get follower count
    pub fn follower_count(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE followed_id = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Get following count
    pub fn following_count(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::Database;

    fn setup() -> (Database, FollowRepository, Uuid, Uuid) {
        let db = Database::in_memory().expect("Failed to create test database");
        let users = UserRepository::new(db.pool.clone());
        let a = users.create("alice", "hash").expect("create failed").id;
        let b = users.create("bob", "hash").expect("create failed").id;
        let repo = FollowRepository::new(db.pool.clone());
        (db, repo, a, b)
    }

    #[test]
    fn test_follow_unfollow_round_trip() {
        let (_db, repo, alice, bob) = setup();

        assert!(!repo.is_following(&alice, &bob).unwrap());
        assert!(repo.follow(&alice, &bob).unwrap());
        assert!(repo.is_following(&alice, &bob).unwrap());
        // Asymmetric: bob does not follow alice back
        assert!(!repo.is_following(&bob, &alice).unwrap());

        assert_eq!(repo.unfollow(&alice, &bob).unwrap(), 1);
        assert!(!repo.is_following(&alice, &bob).unwrap());
        assert_eq!(repo.follower_count(&bob).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_follow_is_noop() {
        let (_db, repo, alice, bob) = setup();

        assert!(repo.follow(&alice, &bob).unwrap());
        assert!(!repo.follow(&alice, &bob).unwrap());
        assert_eq!(repo.follower_count(&bob).unwrap(), 1);
    }

    #[test]
    fn test_unfollow_without_edge_is_noop() {
        let (_db, repo, alice, bob) = setup();
        assert_eq!(repo.unfollow(&alice, &bob).unwrap(), 0);
    }

    #[test]
    fn test_counts_and_lists() {
        let (db, repo, alice, bob) = setup();
        let carol = UserRepository::new(db.pool.clone())
            .create("carol", "hash")
            .expect("create failed")
            .id;

        repo.follow(&alice, &bob).unwrap();
        repo.follow(&carol, &bob).unwrap();
        repo.follow(&bob, &alice).unwrap();

        assert_eq!(repo.follower_count(&bob).unwrap(), 2);
        assert_eq!(repo.following_count(&bob).unwrap(), 1);

        let followers = repo.followers(&bob).unwrap();
        assert_eq!(followers.len(), 2);
        assert!(followers.contains(&alice));
        assert!(followers.contains(&carol));

        let page = repo.followers_page(&bob, 1, 1).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert!(page.has_next);
    }
}
