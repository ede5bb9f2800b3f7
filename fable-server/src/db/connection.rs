use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use uuid::Uuid;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool.
    ///
    /// Every pooled connection enables `PRAGMA foreign_keys`; the cascade
    /// deletes declared in the schema depend on it.
    pub fn new(path: &str) -> Result<Self> {
        let manager = Self::create_connection_manager(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path.
    ///
    /// `:memory:` maps to a uniquely named shared-cache URI so that every
    /// connection in the pool sees the same in-memory database.
    fn create_connection_manager(path: &str) -> SqliteConnectionManager {
        if path.trim().eq_ignore_ascii_case(MEMORY_DB_PATH) {
            let uri = format!("file:fable-{}?mode=memory&cache=shared", Uuid::new_v4());
            SqliteConnectionManager::file(uri)
        } else {
            SqliteConnectionManager::file(path)
        }
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let db = Self::new(MEMORY_DB_PATH)?;
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");

        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"posts".to_string()));
        assert!(tables.contains(&"comments".to_string()));
        assert!(tables.contains(&"likes".to_string()));
        assert!(tables.contains(&"follows".to_string()));
        assert!(tables.contains(&"notifications".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
    }

    #[test]
    fn test_foreign_keys_enabled_on_pooled_connections() {
        let db = Database::in_memory().expect("Failed to create database");
        let conn = db.connection().expect("Failed to get connection");
        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("Failed to read pragma");
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_memory_pools_share_one_database() {
        let db = Database::in_memory().expect("Failed to create database");

        // Write through one pooled connection, read through another.
        let conn_a = db.connection().expect("Failed to get connection");
        conn_a
            .execute(
                "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
                ("u1", "alice", "hash", "2024-01-01T00:00:00Z"),
            )
            .expect("Failed to insert user");

        let conn_b = db.connection().expect("Failed to get connection");
        let count: i64 = conn_b
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .expect("Failed to count users");
        assert_eq!(count, 1);
    }
}
