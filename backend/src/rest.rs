use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use shared::{CreateRecordRequest, UpdateRecordRequest};
use std::sync::Arc;
use tracing::info;

use crate::db::DbConnection;
use crate::domain::{
    CreateRecordService, DeleteRecordService, ListRecordsService, ServiceError,
    UpdateRecordService,
};
use crate::storage::{RecordFilter, RecordOrder, SqliteRecordStore};
use crate::weather::WeatherTable;

/// Application state carrying the four record services
#[derive(Clone)]
pub struct AppState {
    pub create_service: CreateRecordService<SqliteRecordStore>,
    pub update_service: UpdateRecordService<SqliteRecordStore>,
    pub delete_service: DeleteRecordService<SqliteRecordStore>,
    pub list_service: ListRecordsService<SqliteRecordStore>,
}

impl AppState {
    /// Build the services over one store and the startup-built weather table
    pub fn new(db: DbConnection, weather: Arc<WeatherTable>) -> Self {
        let store = SqliteRecordStore::new(db);
        Self {
            create_service: CreateRecordService::new(store.clone()),
            update_service: UpdateRecordService::new(store.clone()),
            delete_service: DeleteRecordService::new(store.clone()),
            list_service: ListRecordsService::new(store, weather),
        }
    }
}

/// Query parameters for the record list endpoint
#[derive(Deserialize, Debug)]
pub struct ListRecordsQuery {
    pub order_by: Option<String>,
}

fn service_error_response(err: ServiceError) -> Response {
    let status = match err {
        ServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::DuplicateRecord => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

/// Axum handler function for GET /api/records
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<ListRecordsQuery>,
) -> impl IntoResponse {
    info!("GET /api/records - query: {:?}", query);

    // Unrecognized order_by values fall back to id ordering
    let order = query
        .order_by
        .as_deref()
        .and_then(RecordOrder::parse)
        .unwrap_or_default();

    match state.list_service.list(order).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            tracing::error!("Error listing records: {:?}", e);
            service_error_response(e)
        }
    }
}

/// Axum handler function for POST /api/records
pub async fn create_record(
    State(state): State<AppState>,
    Json(request): Json<CreateRecordRequest>,
) -> impl IntoResponse {
    info!("POST /api/records - request: {:?}", request);

    match state.create_service.create(request).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => {
            tracing::error!("Error creating record: {:?}", e);
            service_error_response(e)
        }
    }
}

/// Axum handler function for PUT /api/records/:id
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRecordRequest>,
) -> impl IntoResponse {
    info!("PUT /api/records/{} - request: {:?}", id, request);

    match state.update_service.update(RecordFilter::by_id(id), request).await {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(e) => {
            tracing::error!("Error updating record {}: {:?}", id, e);
            service_error_response(e)
        }
    }
}

/// Axum handler function for DELETE /api/records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/records/{}", id);

    match state.delete_service.delete(RecordFilter::by_id(id)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Error deleting record {}: {:?}", id, e);
            service_error_response(e)
        }
    }
}
