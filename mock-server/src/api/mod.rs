//! Route handlers, one module per collection.

pub mod books;
pub mod categories;
pub mod loans;
pub mod users;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{error::MockError, AppState};

/// The caller behind a valid bearer token.
pub struct Authenticated {
    pub user_id: String,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = MockError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| MockError::Unauthorized("Token não fornecido".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| MockError::Unauthorized("Formato de token inválido".to_string()))?;

        let db = state.read().await;
        let user_id = db
            .sessions
            .get(token)
            .cloned()
            .ok_or_else(|| MockError::Unauthorized("Token inválido ou expirado".to_string()))?;
        Ok(Authenticated { user_id })
    }
}

/// `{ "sucesso": true, "data": ... }`
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "sucesso": true, "data": data }))
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, ok(data))
}

pub fn done(message: &str) -> Json<Value> {
    Json(json!({ "sucesso": true, "message": message }))
}

/// A field the backend requires to be non-blank.
pub fn required(value: &str, message: &str) -> Result<(), MockError> {
    if value.trim().is_empty() {
        return Err(MockError::BadRequest(message.to_string()));
    }
    Ok(())
}
