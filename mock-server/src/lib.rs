//! In-memory stand-in for the library REST backend.
//!
//! Serves the `/api` routes the client core talks to, with the backend's
//! Portuguese field names, the `{ sucesso, data }` envelope, bearer tokens
//! issued at login, page/limit pagination and the loan rules that move book
//! counters. State lives behind one `RwLock` and is lost on exit.

pub mod api;
pub mod error;
pub mod models;

use std::{collections::HashMap, sync::Arc};

use axum::{
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

use models::{Book, Category, Loan, User};

pub const ADMIN_EMAIL: &str = "admin@biblioteca.com";
pub const ADMIN_PASSWORD: &str = "Admin@123";

#[derive(Default)]
pub struct Db {
    pub books: Vec<Book>,
    pub categories: Vec<Category>,
    pub users: Vec<User>,
    pub loans: Vec<Loan>,
    /// Issued token -> user id.
    pub sessions: HashMap<String, String>,
}

impl Db {
    /// An empty library with one administrator account.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let admin = User {
            id: new_id(),
            name: "Administrador".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            role: "admin".to_string(),
            document: String::new(),
            phone: String::new(),
            address: None,
            active: true,
            birth_date: None,
            created_at: now,
            updated_at: now,
        };
        Self {
            users: vec![admin],
            ..Self::default()
        }
    }
}

pub type AppState = Arc<RwLock<Db>>;

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn app() -> Router {
    app_with(Db::seeded())
}

pub fn app_with(db: Db) -> Router {
    let state: AppState = Arc::new(RwLock::new(db));
    Router::new()
        .route("/api/usuarios/login", post(api::users::login))
        .route("/api/usuarios", get(api::users::list).post(api::users::create))
        .route(
            "/api/usuarios/{id}",
            get(api::users::get_one).put(api::users::update).delete(api::users::delete),
        )
        .route("/api/usuarios/{id}/status", patch(api::users::set_status))
        .route("/api/usuarios/{id}/tipo", patch(api::users::set_role))
        .route("/api/usuarios/{id}/senha", patch(api::users::change_password))
        .route("/api/livros", get(api::books::list).post(api::books::create))
        .route("/api/livros/busca", get(api::books::search))
        .route(
            "/api/livros/{id}",
            get(api::books::get_one).put(api::books::update).delete(api::books::delete),
        )
        .route(
            "/api/categorias",
            get(api::categories::list).post(api::categories::create),
        )
        .route(
            "/api/categorias/{id}",
            get(api::categories::get_one)
                .put(api::categories::update)
                .delete(api::categories::delete),
        )
        .route("/api/categorias/{id}/livros", get(api::categories::books))
        .route("/api/emprestimos", get(api::loans::list).post(api::loans::create))
        .route("/api/emprestimos/atrasados", get(api::loans::overdue))
        .route("/api/emprestimos/usuario/{id}", get(api::loans::by_user))
        .route("/api/emprestimos/livro/{id}", get(api::loans::by_book))
        .route(
            "/api/emprestimos/{id}",
            get(api::loans::get_one).put(api::loans::update).delete(api::loans::delete),
        )
        .route("/api/emprestimos/{id}/devolver", patch(api::loans::return_loan))
        .route("/api/emprestimos/{id}/renovar", patch(api::loans::renew))
        .route("/api/emprestimos/{id}/multa/pagar", patch(api::loans::pay_fine))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}
