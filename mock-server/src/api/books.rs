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
    models::{Book, BookInput, Paging, SearchQuery},
    new_id, AppState, Db,
};

pub async fn list(
    _auth: Authenticated,
    State(db): State<AppState>,
    Query(paging): Query<Paging>,
) -> Json<Value> {
    let db = db.read().await;
    ok(paging.apply(&db.books))
}

/// Case-insensitive match on title, author or ISBN.
pub async fn search(
    _auth: Authenticated,
    State(db): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Value> {
    let needle = query.q.trim().to_lowercase();
    let db = db.read().await;
    let hits: Vec<&Book> = db
        .books
        .iter()
        .filter(|b| {
            needle.is_empty()
                || b.title.to_lowercase().contains(&needle)
                || b.author.to_lowercase().contains(&needle)
                || b.isbn.to_lowercase().contains(&needle)
        })
        .collect();
    ok(hits)
}

pub async fn get_one(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let db = db.read().await;
    let book = db
        .books
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| MockError::not_found("Livro"))?;
    Ok(ok(book))
}

pub async fn create(
    _auth: Authenticated,
    State(db): State<AppState>,
    Json(input): Json<BookInput>,
) -> MockResult<(StatusCode, Json<Value>)> {
    let mut db = db.write().await;
    let category = checked(&db, &input, None)?;
    if db.books.iter().any(|b| b.isbn == input.isbn) {
        return Err(MockError::BadRequest("ISBN já cadastrado".to_string()));
    }
    let total = input.total.unwrap_or(1);
    let now = Utc::now();
    let book = Book {
        id: new_id(),
        available: input.available.unwrap_or(total),
        title: input.title,
        author: input.author,
        isbn: input.isbn,
        publisher: input.publisher,
        publication_year: input.publication_year,
        category,
        total,
        description: input.description,
        shelf_location: input.shelf_location,
        cover_url: input.cover_url,
        created_at: now,
        updated_at: now,
    };
    db.books.push(book.clone());
    Ok(created(book))
}

/// Changing the copy count shifts the available counter by the same amount.
pub async fn update(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<BookInput>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let category = checked(&db, &input, Some(&id))?;
    let book = db
        .books
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| MockError::not_found("Livro"))?;

    let lent = book.total.saturating_sub(book.available);
    let total = input.total.unwrap_or(book.total);
    if total < lent {
        return Err(MockError::BadRequest(format!(
            "Quantidade não pode ser menor que os {lent} exemplares emprestados"
        )));
    }
    book.total = total;
    book.available = total - lent;
    book.title = input.title;
    book.author = input.author;
    book.isbn = input.isbn;
    book.publisher = input.publisher;
    book.publication_year = input.publication_year;
    book.category = category;
    book.description = input.description;
    book.shelf_location = input.shelf_location;
    book.cover_url = input.cover_url;
    book.updated_at = Utc::now();
    Ok(ok(book.clone()))
}

pub async fn delete(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    if db.loans.iter().any(|l| l.book_id == id && l.is_open()) {
        return Err(MockError::BadRequest(
            "Livro possui empréstimos em aberto".to_string(),
        ));
    }
    let before = db.books.len();
    db.books.retain(|b| b.id != id);
    if db.books.len() == before {
        return Err(MockError::not_found("Livro"));
    }
    Ok(done("Livro removido"))
}

/// Validate a book payload and resolve its category id.
fn checked(db: &Db, input: &BookInput, editing: Option<&str>) -> MockResult<Option<String>> {
    required(&input.title, "Título é obrigatório")?;
    required(&input.author, "Autor é obrigatório")?;
    required(&input.isbn, "ISBN é obrigatório")?;
    if let (Some(total), Some(available)) = (input.total, input.available) {
        if available > total {
            return Err(MockError::BadRequest(
                "Disponíveis não pode exceder a quantidade".to_string(),
            ));
        }
    }
    if editing.is_some_and(|id| db.books.iter().any(|b| b.isbn == input.isbn && b.id != id)) {
        return Err(MockError::BadRequest("ISBN já cadastrado".to_string()));
    }

    let category = match &input.category {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if id.is_empty() => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => other.get("_id").and_then(Value::as_str).map(str::to_string),
    };
    if let Some(id) = &category {
        if !db.categories.iter().any(|c| &c.id == id) {
            return Err(MockError::BadRequest("Categoria inválida".to_string()));
        }
    }
    Ok(category)
}
