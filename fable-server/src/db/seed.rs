use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use fable_types::Post;

use crate::db::repositories::{FollowRepository, PostRepository, UserRepository};
use crate::db::Database;
use crate::password::hash_password_sync;

/// Seed a handful of demo accounts and stories for development.
///
/// Idempotent: if any user already exists the database is assumed seeded
/// and nothing is written. Passwords are hashed at seed time, so this
/// runs once at startup rather than living in the schema script.
pub fn seed_demo_data(db: &Database) -> Result<()> {
    let users = UserRepository::new(db.pool.clone());
    let posts = PostRepository::new(db.pool.clone());
    let follows = FollowRepository::new(db.pool.clone());

    {
        let conn = db.connection()?;
        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if existing > 0 {
            tracing::debug!("Database already has users, skipping demo seed");
            return Ok(());
        }
    }

    let demo_password = hash_password_sync("password123")?;

    let aria = users.create("aria", &demo_password)?;
    users.update_bio(&aria.id, "Fantasy writer. Worlds built nightly.")?;
    let theo = users.create("theo", &demo_password)?;
    users.update_bio(&theo.id, "Short fiction, long walks.")?;
    let mina = users.create("mina", &demo_password)?;

    let samples = [
        (
            &aria,
            "The Lantern Keeper",
            "Every evening at dusk, Wren climbed the hill to light the lanterns \
             nobody else could see.",
            "Fantasy",
            3,
        ),
        (
            &aria,
            "Salt and Cedar",
            "The harbor smelled of salt and cedar the morning the last ship came home.",
            "Adventure",
            2,
        ),
        (
            &theo,
            "Monday, Repeated",
            "He knew it was the same Monday because the barista misspelled his name \
             the same way twice.",
            "Others",
            1,
        ),
    ];

    for (author, title, content, category, age_days) in samples {
        posts.create(&Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            author_username: author.username.clone(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: Utc::now() - Duration::days(age_days),
            likes: 0,
            views: 0,
        })?;
    }

    follows.follow(&theo.id, &aria.id)?;
    follows.follow(&mina.id, &aria.id)?;
    follows.follow(&mina.id, &theo.id)?;

    tracing::info!("Seeded demo data: 3 users, 3 posts");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::in_memory().expect("Failed to create test database");
        seed_demo_data(&db).expect("First seed failed");
        seed_demo_data(&db).expect("Second seed failed");

        let conn = db.connection().expect("Failed to get connection");
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .expect("Failed to count users");
        assert_eq!(users, 3);

        let posts: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .expect("Failed to count posts");
        assert_eq!(posts, 3);
    }

    #[test]
    fn test_seeded_credentials_verify() {
        let db = Database::in_memory().expect("Failed to create test database");
        seed_demo_data(&db).expect("Seed failed");

        let (user, hash) = UserRepository::new(db.pool.clone())
            .find_credentials("aria")
            .expect("Query failed")
            .expect("Missing seeded user");
        assert_eq!(user.username, "aria");

        let parsed = argon2::PasswordHash::new(&hash).expect("Stored hash should parse");
        use argon2::PasswordVerifier;
        assert!(argon2::Argon2::default()
            .verify_password(b"password123", &parsed)
            .is_ok());
    }
}
