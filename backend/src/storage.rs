//! Storage abstraction for garden tree records.
//!
//! The [`RecordStore`] trait hides the concrete backend from the domain
//! layer; [`SqliteRecordStore`] is the SQLite implementation. Store errors
//! are returned untranslated (`sqlx::Error`) so the service layer owns the
//! mapping to user-facing errors.

use shared::{RecordPatch, ValidatedRecord};
use sqlx::{QueryBuilder, Sqlite};

use crate::db::DbConnection;

/// Equality filter over stored records. An unset field matches every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub id: Option<i64>,
}

impl RecordFilter {
    /// Filter matching a single record by id
    pub fn by_id(id: i64) -> Self {
        Self { id: Some(id) }
    }
}

/// Column a record listing can be ordered by. Closed set, so callers can
/// never inject arbitrary SQL through the ordering parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordOrder {
    #[default]
    Id,
    DayOfTheWeek,
    Name,
    FruitsNum,
}

impl RecordOrder {
    /// Parse a caller-supplied ordering name; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "day_of_the_week" => Some(Self::DayOfTheWeek),
            "name" => Some(Self::Name),
            "fruits_num" => Some(Self::FruitsNum),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::DayOfTheWeek => "day_of_the_week",
            Self::Name => "name",
            Self::FruitsNum => "fruits_num",
        }
    }
}

/// A row as persisted, with the weekday still in storage-code form.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredRecord {
    pub id: i64,
    pub day_of_the_week: String,
    pub name: String,
    pub fruits_num: i64,
}

/// Persistence operations over garden tree records.
///
/// Each operation runs as a single statement, so it commits or rolls back
/// as a whole. Uniqueness of (day_of_the_week, name) is enforced by the
/// store at write time and surfaces as a unique-violation database error.
pub trait RecordStore: Send + Sync {
    /// Insert a new record and return its assigned id
    async fn create(&self, record: &ValidatedRecord) -> Result<i64, sqlx::Error>;

    /// Update every row matching the filter with the set fields of the
    /// patch. Returns the number of rows affected; matching zero rows is
    /// not an error, and an empty patch is a no-op.
    async fn update(&self, filter: &RecordFilter, patch: &RecordPatch) -> Result<u64, sqlx::Error>;

    /// Delete every row matching the filter, returning the number deleted
    async fn delete(&self, filter: &RecordFilter) -> Result<u64, sqlx::Error>;

    /// List all rows ordered by the given column
    async fn list(&self, order: RecordOrder) -> Result<Vec<StoredRecord>, sqlx::Error>;
}

/// SQLite-backed record store
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: DbConnection,
}

impl SqliteRecordStore {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

impl RecordStore for SqliteRecordStore {
    async fn create(&self, record: &ValidatedRecord) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO garden_tree_records (day_of_the_week, name, fruits_num) VALUES (?, ?, ?)",
        )
        .bind(record.day_of_the_week.code())
        .bind(&record.name)
        .bind(record.fruits_num)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, filter: &RecordFilter, patch: &RecordPatch) -> Result<u64, sqlx::Error> {
        if patch.is_empty() {
            // Nothing to write; matches the zero-rows-affected contract
            return Ok(0);
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE garden_tree_records SET ");
        let mut assignments = query.separated(", ");
        if let Some(day) = patch.day_of_the_week {
            assignments.push("day_of_the_week = ");
            assignments.push_bind_unseparated(day.code());
        }
        if let Some(name) = &patch.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name.as_str());
        }
        if let Some(fruits_num) = patch.fruits_num {
            assignments.push("fruits_num = ");
            assignments.push_bind_unseparated(fruits_num);
        }

        if let Some(id) = filter.id {
            query.push(" WHERE id = ");
            query.push_bind(id);
        }

        let result = query.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, filter: &RecordFilter) -> Result<u64, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM garden_tree_records");
        if let Some(id) = filter.id {
            query.push(" WHERE id = ");
            query.push_bind(id);
        }

        let result = query.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected())
    }

    async fn list(&self, order: RecordOrder) -> Result<Vec<StoredRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT id, day_of_the_week, name, fruits_num FROM garden_tree_records ORDER BY {}",
            order.column()
        );

        sqlx::query_as::<_, StoredRecord>(&sql)
            .fetch_all(self.db.pool())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Weekday;

    async fn setup_store() -> SqliteRecordStore {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        SqliteRecordStore::new(db)
    }

    fn record(day: Weekday, name: &str, fruits_num: i64) -> ValidatedRecord {
        ValidatedRecord {
            day_of_the_week: day,
            name: name.to_string(),
            fruits_num,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = setup_store().await;

        let id = store
            .create(&record(Weekday::Monday, "Apple", 5))
            .await
            .expect("Failed to create record");

        let rows = store.list(RecordOrder::default()).await.expect("Failed to list");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        // The weekday is persisted as its storage code, not its label
        assert_eq!(rows[0].day_of_the_week, "mn");
        assert_eq!(rows[0].name, "Apple");
        assert_eq!(rows[0].fruits_num, 5);
    }

    #[tokio::test]
    async fn test_duplicate_create_surfaces_unique_violation() {
        let store = setup_store().await;

        store
            .create(&record(Weekday::Monday, "Apple", 5))
            .await
            .expect("First create should succeed");

        let err = store
            .create(&record(Weekday::Monday, "Apple", 9))
            .await
            .expect_err("Duplicate create should fail");

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("Expected a database error, got {:?}", other),
        }

        let rows = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let store = setup_store().await;

        let id = store.create(&record(Weekday::Monday, "Apple", 5)).await.unwrap();

        let patch = RecordPatch {
            fruits_num: Some(9),
            ..Default::default()
        };
        let affected = store
            .update(&RecordFilter::by_id(id), &patch)
            .await
            .expect("Failed to update");
        assert_eq!(affected, 1);

        let rows = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(rows[0].fruits_num, 9);
        assert_eq!(rows[0].name, "Apple");
        assert_eq!(rows[0].day_of_the_week, "mn");
    }

    #[tokio::test]
    async fn test_update_matching_no_rows_affects_none() {
        let store = setup_store().await;

        store.create(&record(Weekday::Monday, "Apple", 5)).await.unwrap();

        let patch = RecordPatch {
            fruits_num: Some(1),
            ..Default::default()
        };
        let affected = store.update(&RecordFilter::by_id(999), &patch).await.unwrap();
        assert_eq!(affected, 0);

        let rows = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(rows[0].fruits_num, 5);
    }

    #[tokio::test]
    async fn test_empty_patch_is_a_no_op() {
        let store = setup_store().await;

        let id = store.create(&record(Weekday::Monday, "Apple", 5)).await.unwrap();

        let affected = store
            .update(&RecordFilter::by_id(id), &RecordPatch::default())
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let rows = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(rows[0].fruits_num, 5);
    }

    #[tokio::test]
    async fn test_update_into_duplicate_pair_fails() {
        let store = setup_store().await;

        store.create(&record(Weekday::Monday, "Apple", 5)).await.unwrap();
        let pear_id = store.create(&record(Weekday::Monday, "Pear", 2)).await.unwrap();

        // Renaming Pear to Apple would collide on (Monday, Apple)
        let patch = RecordPatch {
            name: Some("Apple".to_string()),
            ..Default::default()
        };
        let err = store
            .update(&RecordFilter::by_id(pear_id), &patch)
            .await
            .expect_err("Update into a duplicate pair should fail");

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("Expected a database error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = setup_store().await;

        let id = store.create(&record(Weekday::Monday, "Apple", 5)).await.unwrap();
        store.create(&record(Weekday::Tuesday, "Pear", 2)).await.unwrap();

        let deleted = store.delete(&RecordFilter::by_id(id)).await.unwrap();
        assert_eq!(deleted, 1);

        let rows = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Pear");
    }

    #[tokio::test]
    async fn test_delete_matching_no_rows_is_ok() {
        let store = setup_store().await;

        store.create(&record(Weekday::Monday, "Apple", 5)).await.unwrap();

        let deleted = store.delete(&RecordFilter::by_id(999)).await.unwrap();
        assert_eq!(deleted, 0);

        let rows = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_list_ordering() {
        let store = setup_store().await;

        store.create(&record(Weekday::Tuesday, "Pear", 2)).await.unwrap();
        store.create(&record(Weekday::Monday, "Apple", 7)).await.unwrap();

        let by_name = store.list(RecordOrder::Name).await.unwrap();
        assert_eq!(by_name[0].name, "Apple");
        assert_eq!(by_name[1].name, "Pear");

        let by_fruits = store.list(RecordOrder::FruitsNum).await.unwrap();
        assert_eq!(by_fruits[0].fruits_num, 2);
        assert_eq!(by_fruits[1].fruits_num, 7);

        // Default ordering is insertion (id) order
        let by_id = store.list(RecordOrder::default()).await.unwrap();
        assert_eq!(by_id[0].name, "Pear");
        assert_eq!(by_id[1].name, "Apple");
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(RecordOrder::parse("name"), Some(RecordOrder::Name));
        assert_eq!(RecordOrder::parse("fruits_num"), Some(RecordOrder::FruitsNum));
        assert_eq!(RecordOrder::parse("day_of_the_week"), Some(RecordOrder::DayOfTheWeek));
        assert_eq!(RecordOrder::parse("id"), Some(RecordOrder::Id));
        assert_eq!(RecordOrder::parse("DROP TABLE"), None);
    }
}
