use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:garden.db";

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // One row per tree per weekday; the composite constraint backs the
        // duplicate-record check at write time.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS garden_tree_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                day_of_the_week TEXT NOT NULL,
                name TEXT NOT NULL,
                fruits_num INTEGER NOT NULL,
                CONSTRAINT unique_tree UNIQUE (day_of_the_week, name)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Setup a new test database for each test
    async fn setup_test() -> DbConnection {
        DbConnection::init_test().await.expect("Failed to create test database")
    }

    #[tokio::test]
    async fn test_schema_accepts_a_record() {
        let db = setup_test().await;

        sqlx::query(
            "INSERT INTO garden_tree_records (day_of_the_week, name, fruits_num) VALUES (?, ?, ?)",
        )
        .bind("mn")
        .bind("Apple")
        .bind(5_i64)
        .execute(db.pool())
        .await
        .expect("Failed to insert record");
    }

    #[tokio::test]
    async fn test_unique_tree_constraint() {
        let db = setup_test().await;

        let insert = "INSERT INTO garden_tree_records (day_of_the_week, name, fruits_num) VALUES (?, ?, ?)";

        sqlx::query(insert)
            .bind("mn")
            .bind("Apple")
            .bind(5_i64)
            .execute(db.pool())
            .await
            .expect("First insert should succeed");

        // Same tree on the same weekday violates the composite constraint
        let err = sqlx::query(insert)
            .bind("mn")
            .bind("Apple")
            .bind(7_i64)
            .execute(db.pool())
            .await
            .expect_err("Duplicate insert should fail");

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("Expected a database error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_tree_on_another_weekday_is_allowed() {
        let db = setup_test().await;

        let insert = "INSERT INTO garden_tree_records (day_of_the_week, name, fruits_num) VALUES (?, ?, ?)";

        sqlx::query(insert)
            .bind("mn")
            .bind("Apple")
            .bind(5_i64)
            .execute(db.pool())
            .await
            .expect("First insert should succeed");

        sqlx::query(insert)
            .bind("ts")
            .bind("Apple")
            .bind(3_i64)
            .execute(db.pool())
            .await
            .expect("Same name on a different weekday should succeed");
    }
}
