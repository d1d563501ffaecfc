//! Stateless HTTP request builder and response parser for the library API.
//!
//! # Design
//! `LibraryClient` holds the backend origin and the bearer token, nothing
//! else. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`; the
//! caller executes the round-trip in between. The plain CRUD operations are
//! generic over `Resource`, entity-specific endpoints live in the submodules.
//!
//! Success payloads may be bare or wrapped in `{ "sucesso": true, "data": ... }`
//! depending on the backend revision; both are accepted.

mod auth;
mod books;
mod loans;
mod users;

pub use auth::AuthCheckRequest;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::Resource;

/// Synchronous, stateless client for the library API.
#[derive(Debug, Clone)]
pub struct LibraryClient {
    base_url: String,
    token: Option<String>,
}

impl LibraryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Generic CRUD
    // -----------------------------------------------------------------------

    pub fn build_list<R: Resource>(&self) -> HttpRequest {
        self.request(HttpMethod::Get, R::ENDPOINT.to_string(), None)
    }

    /// One page of a collection. Pages are 1-based.
    pub fn build_list_page<R: Resource>(&self, page: u32, limit: u32) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{}?page={page}&limit={limit}", R::ENDPOINT),
            None,
        )
    }

    pub fn build_get<R: Resource>(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/{}", R::ENDPOINT, encode(id)), None)
    }

    pub fn build_create<R: Resource>(&self, input: &R::Input) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, R::ENDPOINT.to_string(), input)
    }

    pub fn build_update<R: Resource>(&self, id: &str, input: &R::Input) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, format!("{}/{}", R::ENDPOINT, encode(id)), input)
    }

    pub fn build_delete<R: Resource>(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("{}/{}", R::ENDPOINT, encode(id)), None)
    }

    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R>, ApiError> {
        decode(response, R::LABEL)
    }

    /// Parses any endpoint that answers with a single record: get, create,
    /// update and the state-changing PATCH actions.
    pub fn parse_one<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        decode(response, R::LABEL)
    }

    pub fn parse_delete<R: Resource>(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, R::LABEL)
    }

    // -----------------------------------------------------------------------
    // Request helpers
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = &self.token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: self.url(&path),
            headers,
            body,
        }
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: String,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(method, path, Some(body)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

fn decode<T: DeserializeOwned>(response: HttpResponse, context: &str) -> Result<T, ApiError> {
    check_status(&response, context)?;
    serde_json::from_str::<Envelope<T>>(&response.body)
        .map(Envelope::into_inner)
        .map_err(|e| ApiError::Deserialization(format!("{context}: {e}")))
}

/// Map non-2xx statuses to the matching `ApiError` variant, preferring the
/// server's own message.
pub(crate) fn check_status(response: &HttpResponse, context: &str) -> Result<(), ApiError> {
    let status = response.status;
    if (200..300).contains(&status) {
        debug!(status, context, "request succeeded");
        return Ok(());
    }

    let message = server_message(&response.body)
        .unwrap_or_else(|| format!("request for {context} failed with status {status}"));

    Err(match status {
        401 => {
            warn!(context, "unauthorized; session must end");
            ApiError::Unauthorized(message)
        }
        403 => {
            warn!(context, %message, "access forbidden");
            ApiError::Forbidden(message)
        }
        404 => {
            warn!(context, %message, "resource not found");
            ApiError::NotFound(message)
        }
        400..=499 => {
            warn!(status, context, %message, "request rejected");
            ApiError::Rejected { status, message }
        }
        500..=599 => {
            error!(status, context, %message, "server error");
            ApiError::Server { status, message }
        }
        _ => {
            error!(status, context, "unexpected status");
            ApiError::UnexpectedStatus {
                status,
                body: response.body.clone(),
            }
        }
    })
}

/// The `message` (or `mensagem`/`erro`/`error`) string of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "mensagem", "erro", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Percent-encode a path segment or query value.
pub(crate) fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
