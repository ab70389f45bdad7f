use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// A stored JSON object. Payloads are kept verbatim, envelopes included.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub payload: Map<String, Value>,
}

/// Listing of every stored record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    pub count: usize,
    pub records: Vec<Record>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Record>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/payloads", get(list_records).post(create_record))
        .route(
            "/payloads/{id}",
            get(get_record)
                .put(replace_record)
                .patch(merge_record)
                .delete(delete_record),
        )
        .route("/echo", post(echo))
        .route("/plain", get(plain))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_records(State(db): State<Db>) -> Json<Listing> {
    let records: Vec<Record> = db.read().await.values().cloned().collect();
    Json(Listing {
        count: records.len(),
        records,
    })
}

async fn create_record(
    State(db): State<Db>,
    Json(payload): Json<Map<String, Value>>,
) -> (StatusCode, Json<Record>) {
    let record = Record {
        id: Uuid::new_v4(),
        payload,
    };
    info!(id = %record.id, "stored payload");
    db.write().await.insert(record.id, record.clone());
    (StatusCode::CREATED, Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Record>, StatusCode> {
    let records = db.read().await;
    records.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn replace_record(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Record>, StatusCode> {
    let mut records = db.write().await;
    let record = records.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    record.payload = payload;
    Ok(Json(record.clone()))
}

/// Top-level keys in the request replace the stored ones; others are kept.
async fn merge_record(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Record>, StatusCode> {
    let mut records = db.write().await;
    let record = records.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    record.payload.extend(payload);
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut records = db.write().await;
    records.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(Json(payload): Json<Map<String, Value>>) -> Json<Map<String, Value>> {
    Json(payload)
}

async fn plain() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "not json")
}
