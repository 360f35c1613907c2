use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

/// The `users(id, name, age)` table.
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Opens (creating if needed) the database file and ensures the table exists.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::with_pool(pool).await
    }

    /// A private database that lives as long as the store.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = UserStore { pool };
        store.create_table().await?;
        Ok(store)
    }

    pub async fn create_table(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;
        Ok(())
    }

    /// Returns the new row id.
    pub async fn insert(&self, name: &str, age: i64) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (name, age) VALUES (?, ?)")
            .bind(name)
            .bind(age)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert user {name}"))?;
        debug!("Inserted user {} with id {}", name, result.last_insert_rowid());
        Ok(result.last_insert_rowid())
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, name, age FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;
        Ok(users)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vec<User>> {
        let users =
            sqlx::query_as::<_, User>("SELECT id, name, age FROM users WHERE name = ? ORDER BY id")
                .bind(name)
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("Failed to look up user {name}"))?;
        Ok(users)
    }

    /// Updates every user with this name; returns how many rows changed.
    pub async fn update_age(&self, name: &str, age: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE users SET age = ? WHERE name = ?")
            .bind(age)
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update user {name}"))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_name(&self, name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete user {name}"))?;
        Ok(result.rows_affected())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_user_crud_cycle() -> Result<()> {
        let store = UserStore::in_memory().await?;

        let alice = store.insert("Alice", 30).await?;
        store.insert("Bob", 25).await?;
        assert_eq!(alice, 1);

        let users = store.list().await?;
        assert_eq!(users.len(), 2);
        assert_eq!(
            users[0],
            User {
                id: 1,
                name: "Alice".to_string(),
                age: 30
            }
        );

        assert_eq!(store.update_age("Alice", 31).await?, 1);
        assert_eq!(store.find_by_name("Alice").await?[0].age, 31);
        assert_eq!(store.update_age("Carol", 40).await?, 0);

        assert_eq!(store.delete_by_name("Bob").await?, 1);
        let remaining = store.list().await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Alice");
        Ok(())
    }

    #[tokio::test]
    async fn test_file_database_persists() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("data").join("users.db");

        let store = UserStore::open(&path).await?;
        store.insert("Alice", 30).await?;
        store.close().await;

        let reopened = UserStore::open(&path).await?;
        assert_eq!(reopened.find_by_name("Alice").await?.len(), 1);
        Ok(())
    }
}
