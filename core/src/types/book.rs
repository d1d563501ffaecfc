use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{Category, Ref};

/// A catalog title and its copy counters.
///
/// `total` and `available` are maintained by the server: a loan takes one
/// copy, a return gives it back, a renewal leaves both untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "check_copies"))]
pub struct Book {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "titulo")]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(rename = "autor")]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[serde(rename = "editora", default)]
    pub publisher: String,
    #[serde(rename = "anoPublicacao", default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 2100, message = "Publication year is out of range"))]
    pub publication_year: Option<i32>,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Ref<Category>>,
    #[serde(rename = "quantidade", default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(rename = "disponiveis", default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "localizacao", default, skip_serializing_if = "Option::is_none")]
    pub shelf_location: Option<String>,
    #[serde(rename = "capa", default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Whether at least one copy can be lent out. Unknown availability counts
    /// as unavailable.
    pub fn is_available(&self) -> bool {
        self.available.is_some_and(|n| n > 0)
    }

    pub fn available_copies(&self) -> u32 {
        self.available.unwrap_or(0)
    }
}

fn check_copies(book: &Book) -> Result<(), ValidationError> {
    match (book.available, book.total) {
        (Some(available), Some(total)) if available > total => {
            let mut err = ValidationError::new("copies");
            err.message = Some(Cow::from(
                "Available copies cannot exceed the total number of copies",
            ));
            Err(err)
        }
        _ => Ok(()),
    }
}
