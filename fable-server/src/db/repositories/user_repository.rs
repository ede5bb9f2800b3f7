use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use fable_types::User;

use crate::db::DbPool;

pub struct UserRepository {
    pool: DbPool,
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        username: row.get(1)?,
        bio: row.get(2)?,
        created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
    })
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user with an already-hashed credential
    pub fn create(&self, username: &str, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            bio: None,
            created_at: Utc::now(),
        };
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, password_hash, bio, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                user.id.to_string(),
                &user.username,
                password_hash,
                &user.bio,
                user.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create user")?;
        Ok(user)
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, username, bio, created_at FROM users WHERE id = ?",
                [user_id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by username. The column carries NOCASE collation, so the
    /// lookup is case-insensitive.
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, username, bio, created_at FROM users WHERE username = ?",
                [username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up a user together with their credential hash (login path only)
    pub fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let result = conn
            .query_row(
                "SELECT id, username, bio, created_at, password_hash FROM users WHERE username = ?",
                [username],
                |row| {
                    let user = user_from_row(row)?;
                    let hash: String = row.get(4)?;
                    Ok((user, hash))
                },
            )
            .optional()?;
        Ok(result)
    }

    /// Update user bio
    pub fn update_bio(&self, user_id: &Uuid, bio: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET bio = ? WHERE id = ?",
            [bio, &user_id.to_string()],
        )
        .context("Failed to update user bio")?;
        Ok(())
    }

    /// Delete a user; posts, comments, likes, follows, notifications and
    /// sessions go with them via cascade.
    pub fn delete(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM users WHERE id = ?", [user_id.to_string()])
            .context("Failed to delete user")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> (Database, UserRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        let repo = UserRepository::new(db.pool.clone());
        (db, repo)
    }

    #[test]
    fn test_username_lookup_is_case_insensitive() {
        let (_db, repo) = setup();
        repo.create("Alice", "hash").expect("Failed to create user");

        let found = repo.get_by_username("aLiCe").expect("Query failed");
        assert_eq!(found.map(|u| u.username), Some("Alice".to_string()));
    }

    #[test]
    fn test_duplicate_username_rejected_case_insensitively() {
        let (_db, repo) = setup();
        repo.create("alice", "hash").expect("Failed to create user");
        assert!(repo.create("ALICE", "hash").is_err());
    }

    #[test]
    fn test_find_credentials_returns_hash() {
        let (_db, repo) = setup();
        repo.create("bob", "argon2-hash").expect("Failed to create user");

        let (user, hash) = repo
            .find_credentials("bob")
            .expect("Query failed")
            .expect("User not found");
        assert_eq!(user.username, "bob");
        assert_eq!(hash, "argon2-hash");
    }
}
