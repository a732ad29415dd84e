//! `{ "data": ... }` envelope shared by every successful API response.
//!
//! Errors use `{ "error", "code" }` instead; see [`crate::error`].

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// 200 with the envelope.
pub type Envelope<T> = Json<DataResponse<T>>;

/// 201 with the envelope, for requests that open a new resource.
pub type Created<T> = (StatusCode, Json<DataResponse<T>>);

pub fn ok<T: Serialize>(data: T) -> Envelope<T> {
    Json(DataResponse { data })
}

pub fn created<T: Serialize>(data: T) -> Created<T> {
    (StatusCode::CREATED, Json(DataResponse { data }))
}
