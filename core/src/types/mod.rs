//! Domain records exchanged with the library backend.
//!
//! # Design
//! Rust field names are English; the wire keeps the backend's Portuguese
//! names through `#[serde(rename)]`. Server-managed fields (`_id`,
//! timestamps) are optional and skipped when absent, so the same record type
//! doubles as the create/update payload for books, categories and users.
//! Loans are the exception: their user and book are references that must go
//! out as plain ids, hence the separate `LoanInput`.

mod book;
mod category;
mod loan;
mod reference;
mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

pub use book::Book;
pub use category::Category;
pub use loan::{Loan, LoanInput, LoanStatus};
pub use reference::Ref;
pub use user::{Credentials, LoginResponse, PasswordChange, User};

/// A server-owned record reachable under a REST collection endpoint.
pub trait Resource: Clone + DeserializeOwned {
    /// Collection path, e.g. `/api/livros`.
    const ENDPOINT: &'static str;
    /// Plural noun used in log lines and fallback error messages.
    const LABEL: &'static str;
    /// Payload accepted by create and update, checked locally before it is
    /// sent.
    type Input: Serialize + Validate;

    fn id(&self) -> Option<&str>;
}

impl Resource for Book {
    const ENDPOINT: &'static str = "/api/livros";
    const LABEL: &'static str = "books";
    type Input = Book;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Category {
    const ENDPOINT: &'static str = "/api/categorias";
    const LABEL: &'static str = "categories";
    type Input = Category;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for User {
    const ENDPOINT: &'static str = "/api/usuarios";
    const LABEL: &'static str = "users";
    type Input = User;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Loan {
    const ENDPOINT: &'static str = "/api/emprestimos";
    const LABEL: &'static str = "loans";
    type Input = LoanInput;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
