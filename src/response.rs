use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

/// Wrap a payload in the success envelope: `{ "success": true, "data": ... }`.
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Success envelope with a human-readable message instead of data.
pub fn message(msg: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": msg }))
}
