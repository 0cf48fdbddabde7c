use crate::{error::AppError, extract::ClientAddress, state::AppState};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{Html, IntoResponse},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use slotlog_core::{
    render::{render_confirmed, render_visits},
    sorted_by_timestamp,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
struct SlotPayload {
    data: Option<String>,
    time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VisitPayload {
    page: Option<String>,
    time: Option<String>,
}

/// Decode a JSON body, treating anything unreadable as an empty payload
///
/// The required-field checks then answer with the usual `Missing ...` text.
fn payload<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    if body.iter().all(u8::is_ascii_whitespace) {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Unreadable request body: {}", e);
        T::default()
    })
}

fn ok() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn slot_request(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let SlotPayload { data, time } = payload(&body);
    let record = state
        .ledger
        .record_request(
            &client,
            data.as_deref().unwrap_or_default(),
            time.as_deref().unwrap_or_default(),
        )
        .await?;

    info!("Slot request {} from {}", record.token, client);
    Ok(ok())
}

pub async fn slot_confirm(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let SlotPayload { data, .. } = payload(&body);
    let record = state
        .ledger
        .confirm(&client, data.as_deref().unwrap_or_default())
        .await?;

    info!("Slot {} confirmed for {}", record.token, client);
    Ok(ok())
}

pub async fn confirmed_page(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
) -> Result<Html<String>, AppError> {
    let records = sorted_by_timestamp(state.ledger.confirmed(&client).await?);
    Ok(Html(render_confirmed(&records)))
}

pub async fn visits_page(
    State(state): State<Arc<AppState>>,
    ClientAddress(client): ClientAddress,
) -> Result<Html<String>, AppError> {
    let visits = sorted_by_timestamp(state.ledger.visits(&client).await?);
    Ok(Html(render_visits(&visits, &state.display)))
}

pub async fn log_request(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let SlotPayload { data, time } = payload(&body);
    state
        .ledger
        .log_request(
            data.as_deref().unwrap_or_default(),
            time.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(ok())
}

pub async fn log_visit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let VisitPayload { page, time } = payload(&body);
    state
        .ledger
        .log_visit(page.as_deref(), time.as_deref().unwrap_or_default())
        .await?;
    Ok(ok())
}
