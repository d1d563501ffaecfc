//! Records as the backend stores and serves them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CategoryInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autor")]
    pub author: String,
    pub isbn: String,
    #[serde(rename = "editora")]
    pub publisher: String,
    #[serde(rename = "anoPublicacao", skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "quantidade")]
    pub total: u32,
    #[serde(rename = "disponiveis")]
    pub available: u32,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "localizacao", skip_serializing_if = "Option::is_none")]
    pub shelf_location: Option<String>,
    #[serde(rename = "capa", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct BookInput {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autor")]
    pub author: String,
    pub isbn: String,
    #[serde(rename = "editora", default)]
    pub publisher: String,
    #[serde(rename = "anoPublicacao")]
    pub publication_year: Option<i32>,
    /// An id, or an embedded category whose `_id` is taken.
    #[serde(rename = "categoria")]
    pub category: Option<Value>,
    #[serde(rename = "quantidade")]
    pub total: Option<u32>,
    #[serde(rename = "disponiveis")]
    pub available: Option<u32>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "localizacao")]
    pub shelf_location: Option<String>,
    #[serde(rename = "capa")]
    pub cover_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(rename = "tipo")]
    pub role: String,
    #[serde(rename = "documento")]
    pub document: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "endereco", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "dataNascimento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct UserInput {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: Option<String>,
    #[serde(rename = "tipo")]
    pub role: Option<String>,
    #[serde(rename = "documento", default)]
    pub document: String,
    #[serde(rename = "telefone", default)]
    pub phone: String,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "ativo")]
    pub active: Option<bool>,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Deserialize)]
pub struct StatusInput {
    #[serde(rename = "ativo")]
    pub active: bool,
}

#[derive(Deserialize)]
pub struct RoleInput {
    #[serde(rename = "tipo")]
    pub role: String,
}

#[derive(Deserialize)]
pub struct PasswordInput {
    #[serde(rename = "senhaAtual")]
    pub current: String,
    #[serde(rename = "novaSenha")]
    pub new: String,
}

pub const PENDING: &str = "pendente";
pub const RENEWED: &str = "renovado";
pub const RETURNED: &str = "devolvido";
pub const OVERDUE: &str = "atrasado";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Loan {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "usuario")]
    pub user_id: String,
    #[serde(rename = "livro")]
    pub book_id: String,
    #[serde(rename = "dataEmprestimo")]
    pub loan_date: DateTime<Utc>,
    #[serde(rename = "dataPrevistaDevolucao")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "dataDevolucao", skip_serializing_if = "Option::is_none")]
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(rename = "multa")]
    pub fine: f64,
    #[serde(rename = "renovacoes")]
    pub renewals: u32,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Open loans past their due date read as overdue.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        if self.is_open() && self.due_date < now {
            self.status = OVERDUE.to_string();
        }
    }
}

#[derive(Deserialize)]
pub struct LoanInput {
    #[serde(rename = "usuario")]
    pub user_id: String,
    #[serde(rename = "livro")]
    pub book_id: String,
    #[serde(rename = "dataEmprestimo")]
    pub loan_date: Option<DateTime<Utc>>,
    #[serde(rename = "dataPrevistaDevolucao")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct Paging {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl Paging {
    /// The requested slice; the whole list when no limit was given.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        match self.limit {
            Some(limit) if limit > 0 => {
                let page = self.page.unwrap_or(1).max(1);
                items
                    .iter()
                    .skip((page - 1).saturating_mul(limit))
                    .take(limit)
                    .cloned()
                    .collect()
            }
            _ => items.to_vec(),
        }
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}
