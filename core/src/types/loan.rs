use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{Book, Ref, User};

/// Server-side status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "renovado")]
    Renewed,
    #[serde(rename = "devolvido")]
    Returned,
    #[serde(rename = "atrasado")]
    Overdue,
}

impl LoanStatus {
    /// Open loans still hold a copy of the book.
    pub fn is_open(self) -> bool {
        !matches!(self, LoanStatus::Returned)
    }

    pub fn label(self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Renewed => "renewed",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }
}

/// A book lent to a user.
///
/// See `lifecycle` for the rules derived from these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "usuario", default)]
    pub user: Ref<User>,
    #[serde(rename = "livro", default)]
    pub book: Ref<Book>,
    #[serde(rename = "dataEmprestimo", default, skip_serializing_if = "Option::is_none")]
    pub loan_date: Option<DateTime<Utc>>,
    #[serde(rename = "dataPrevistaDevolucao")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "dataDevolucao", default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LoanStatus>,
    #[serde(rename = "multa", default, skip_serializing_if = "Option::is_none")]
    pub fine: Option<f64>,
    #[serde(rename = "renovacoes", default, skip_serializing_if = "Option::is_none")]
    pub renewals: Option<u32>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a loan. References always go out as ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "check_dates"))]
pub struct LoanInput {
    #[serde(rename = "usuario")]
    #[validate(length(min = 1, message = "A user must be selected"))]
    pub user_id: String,
    #[serde(rename = "livro")]
    #[validate(length(min = 1, message = "A book must be selected"))]
    pub book_id: String,
    #[serde(rename = "dataEmprestimo", default, skip_serializing_if = "Option::is_none")]
    pub loan_date: Option<DateTime<Utc>>,
    #[serde(rename = "dataPrevistaDevolucao")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LoanInput {
    pub fn new(user_id: impl Into<String>, book_id: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            book_id: book_id.into(),
            loan_date: None,
            due_date,
            notes: None,
        }
    }

    /// Edit form seeded from an existing loan. Returns `None` when either
    /// reference carries no id.
    pub fn from_loan(loan: &Loan) -> Option<Self> {
        Some(Self {
            user_id: loan.user.id()?.to_string(),
            book_id: loan.book.id()?.to_string(),
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            notes: loan.notes.clone(),
        })
    }
}

fn check_dates(input: &LoanInput) -> Result<(), ValidationError> {
    match input.loan_date {
        Some(loan_date) if input.due_date < loan_date => {
            let mut err = ValidationError::new("due_date");
            err.message = Some(Cow::from("The due date cannot precede the loan date"));
            Err(err)
        }
        _ => Ok(()),
    }
}
