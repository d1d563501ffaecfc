//! Client core for the library administration API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host executes the actual
//! round-trip through a `Transport`, which keeps the core deterministic and
//! testable.
//!
//! # Design
//! - `LibraryClient` is stateless apart from the base URL and bearer token;
//!   every operation is a `build_*`/`parse_*` pair.
//! - `Library` is the stateful facade: it owns the `Session`, the per-entity
//!   `Stores` and a `Transport`, and applies the loan and login rules before
//!   anything is sent.
//! - Records are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod library;
pub mod lifecycle;
pub mod pagination;
pub mod stats;
pub mod store;
pub mod types;
pub mod validation;

pub use auth::{MemoryStorage, Permission, Role, Session, Storage};
pub use client::LibraryClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use library::Library;
pub use lifecycle::{DueState, FormMode, LoanEvent};
pub use stats::DashboardStats;
pub use store::{Collection, Stores};
pub use types::{Book, Category, Credentials, Loan, LoanInput, LoanStatus, PasswordChange, Ref, User};
