//! Record services: validation, persistence, error translation, and the
//! list-time weather join.

use std::sync::Arc;

use shared::{
    validate_create, validate_update, CreateRecordRequest, FieldError, RecordResponse,
    UpdateRecordRequest, UnknownWeekday, Weekday,
};
use tracing::{info, warn};

use crate::storage::{RecordFilter, RecordOrder, RecordStore};
use crate::weather::WeatherTable;

/// Typed failure surface of the record services.
///
/// Validation and uniqueness failures are translated here; every other
/// store error passes through as [`ServiceError::Storage`] untouched.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid input in field(s): {}", field_list(.0))]
    InvalidInput(Vec<FieldError>),
    #[error("a record for this tree on this weekday already exists")]
    DuplicateRecord,
    #[error("failed to delete records: {0}")]
    DeleteFailed(#[source] sqlx::Error),
    #[error("no temperature recorded for {0}")]
    MissingTemperature(Weekday),
    #[error("stored weekday code is outside the vocabulary: {0}")]
    CorruptRecord(#[from] UnknownWeekday),
    #[error(transparent)]
    Storage(sqlx::Error),
}

fn field_list(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Translate a write-path store error, keeping everything but the
/// uniqueness violation untouched.
fn translate_write_error(err: sqlx::Error) -> ServiceError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            warn!("Write rejected by the unique (day_of_the_week, name) constraint");
            ServiceError::DuplicateRecord
        }
        _ => ServiceError::Storage(err),
    }
}

/// Service for creating garden records
#[derive(Clone)]
pub struct CreateRecordService<S> {
    store: S,
}

impl<S: RecordStore> CreateRecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and persist a new record, returning its assigned id
    pub async fn create(&self, request: CreateRecordRequest) -> Result<i64, ServiceError> {
        info!(
            "Creating record: day={}, name={}, fruits={}",
            request.day_of_the_week, request.name, request.fruits_num
        );

        let record = validate_create(&request).map_err(ServiceError::InvalidInput)?;

        let id = self
            .store
            .create(&record)
            .await
            .map_err(translate_write_error)?;

        info!("Created record {} for {} on {}", id, record.name, record.day_of_the_week);
        Ok(id)
    }
}

/// Service for partially updating garden records
#[derive(Clone)]
pub struct UpdateRecordService<S> {
    store: S,
}

impl<S: RecordStore> UpdateRecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate the partial payload, drop unset fields, and apply the rest
    /// to every row matching the filter. Returns the number of rows changed.
    pub async fn update(
        &self,
        filter: RecordFilter,
        request: UpdateRecordRequest,
    ) -> Result<u64, ServiceError> {
        info!("Updating records matching {:?}", filter);

        let patch = validate_update(&request).map_err(ServiceError::InvalidInput)?;

        // An all-unset payload still reaches the store as a no-op update
        let affected = self
            .store
            .update(&filter, &patch)
            .await
            .map_err(translate_write_error)?;

        info!("Updated {} record(s)", affected);
        Ok(affected)
    }
}

/// Service for deleting garden records
#[derive(Clone)]
pub struct DeleteRecordService<S> {
    store: S,
}

impl<S: RecordStore> DeleteRecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Delete every row matching the filter. Matching none is a success;
    /// any underlying failure is reported as a delete failure.
    pub async fn delete(&self, filter: RecordFilter) -> Result<u64, ServiceError> {
        info!("Deleting records matching {:?}", filter);

        let deleted = self
            .store
            .delete(&filter)
            .await
            .map_err(ServiceError::DeleteFailed)?;

        info!("Deleted {} record(s)", deleted);
        Ok(deleted)
    }
}

/// Service for listing garden records joined with last week's temperatures.
///
/// The weather table is built once at startup and injected here; a weekday
/// missing from it fails the whole list call rather than producing a record
/// without a temperature.
#[derive(Clone)]
pub struct ListRecordsService<S> {
    store: S,
    weather: Arc<WeatherTable>,
}

impl<S: RecordStore> ListRecordsService<S> {
    pub fn new(store: S, weather: Arc<WeatherTable>) -> Self {
        Self { store, weather }
    }

    pub async fn list(&self, order: RecordOrder) -> Result<Vec<RecordResponse>, ServiceError> {
        info!("Listing records ordered by {:?}", order);

        let rows = self.store.list(order).await.map_err(ServiceError::Storage)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let day = Weekday::from_code(&row.day_of_the_week)?;
            let temperature = self
                .weather
                .get(day)
                .ok_or(ServiceError::MissingTemperature(day))?;

            records.push(RecordResponse {
                id: row.id,
                day_of_the_week: day.label().to_string(),
                name: row.name,
                fruits_num: row.fruits_num,
                temperature,
            });
        }

        info!("Returning {} record(s)", records.len());
        Ok(records)
    }
}
