use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::Value;

use super::{created, done, ok, required, Authenticated};
use crate::{
    error::{MockError, MockResult},
    models::{Category, CategoryInput, Paging},
    new_id, AppState,
};

pub async fn list(
    _auth: Authenticated,
    State(db): State<AppState>,
    Query(paging): Query<Paging>,
) -> Json<Value> {
    let db = db.read().await;
    ok(paging.apply(&db.categories))
}

pub async fn get_one(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let db = db.read().await;
    let category = db
        .categories
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| MockError::not_found("Categoria"))?;
    Ok(ok(category))
}

pub async fn create(
    _auth: Authenticated,
    State(db): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> MockResult<(StatusCode, Json<Value>)> {
    required(&input.name, "Nome da categoria é obrigatório")?;
    let mut db = db.write().await;
    if db.categories.iter().any(|c| c.name.eq_ignore_ascii_case(&input.name)) {
        return Err(MockError::BadRequest("Categoria já existe".to_string()));
    }
    let now = Utc::now();
    let category = Category {
        id: new_id(),
        name: input.name,
        description: input.description,
        created_at: now,
        updated_at: now,
    };
    db.categories.push(category.clone());
    Ok(created(category))
}

pub async fn update(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> MockResult<Json<Value>> {
    required(&input.name, "Nome da categoria é obrigatório")?;
    let mut db = db.write().await;
    let category = db
        .categories
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| MockError::not_found("Categoria"))?;
    category.name = input.name;
    category.description = input.description;
    category.updated_at = Utc::now();
    Ok(ok(category.clone()))
}

pub async fn delete(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    if db.books.iter().any(|b| b.category.as_deref() == Some(id.as_str())) {
        return Err(MockError::BadRequest(
            "Categoria possui livros associados".to_string(),
        ));
    }
    let before = db.categories.len();
    db.categories.retain(|c| c.id != id);
    if db.categories.len() == before {
        return Err(MockError::not_found("Categoria"));
    }
    Ok(done("Categoria removida"))
}

pub async fn books(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let db = db.read().await;
    if !db.categories.iter().any(|c| c.id == id) {
        return Err(MockError::not_found("Categoria"));
    }
    let books: Vec<_> = db
        .books
        .iter()
        .filter(|b| b.category.as_deref() == Some(id.as_str()))
        .collect();
    Ok(ok(books))
}
