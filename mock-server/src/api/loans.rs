//! Loans and the copy counters they move.
//!
//! Creating a loan takes a copy, returning or deleting an open loan gives it
//! back, renewing leaves counters alone. A late return is charged
//! `FINE_PER_DAY` per started day.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{created, done, ok, Authenticated};
use crate::{
    error::{MockError, MockResult},
    models::{Loan, LoanInput, Paging, PENDING, RENEWED, RETURNED},
    new_id, AppState, Db,
};

pub const MAX_RENEWALS: u32 = 2;
pub const RENEWAL_DAYS: i64 = 7;
pub const FINE_PER_DAY: f64 = 1.0;

pub async fn list(
    _auth: Authenticated,
    State(db): State<AppState>,
    Query(paging): Query<Paging>,
) -> Json<Value> {
    let db = db.read().await;
    let page = paging.apply(&db.loans);
    ok(present_all(&db, page.iter()))
}

pub async fn overdue(_auth: Authenticated, State(db): State<AppState>) -> Json<Value> {
    let now = Utc::now();
    let db = db.read().await;
    let late = db.loans.iter().filter(|l| l.is_open() && l.due_date < now);
    ok(present_all(&db, late))
}

pub async fn by_user(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    let db = db.read().await;
    let loans = db.loans.iter().filter(|l| l.user_id == id);
    ok(present_all(&db, loans))
}

pub async fn by_book(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    let db = db.read().await;
    let loans = db.loans.iter().filter(|l| l.book_id == id);
    ok(present_all(&db, loans))
}

pub async fn get_one(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let db = db.read().await;
    let loan = find(&db, &id)?;
    Ok(ok(present(&db, loan)))
}

pub async fn create(
    _auth: Authenticated,
    State(db): State<AppState>,
    Json(input): Json<LoanInput>,
) -> MockResult<(StatusCode, Json<Value>)> {
    let now = Utc::now();
    let loan_date = input.loan_date.unwrap_or(now);
    check_dates(loan_date, input.due_date)?;

    let mut db = db.write().await;
    match db.users.iter().find(|u| u.id == input.user_id) {
        None => return Err(MockError::not_found("Usuário")),
        Some(user) if !user.active => {
            return Err(MockError::BadRequest("Usuário inativo".to_string()))
        }
        Some(_) => {}
    }
    take_copy(&mut db, &input.book_id)?;

    let loan = Loan {
        id: new_id(),
        user_id: input.user_id,
        book_id: input.book_id,
        loan_date,
        due_date: input.due_date,
        return_date: None,
        status: PENDING.to_string(),
        fine: 0.0,
        renewals: 0,
        notes: input.notes,
        created_at: now,
        updated_at: now,
    };
    tracing::info!(loan = %loan.id, book = %loan.book_id, "loan created");
    db.loans.push(loan.clone());
    Ok(created(present(&db, &loan)))
}

/// Moving an open loan to another book transfers the copy.
pub async fn update(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<LoanInput>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let current = find(&db, &id)?.clone();
    let loan_date = input.loan_date.unwrap_or(current.loan_date);
    check_dates(loan_date, input.due_date)?;
    if !db.users.iter().any(|u| u.id == input.user_id) {
        return Err(MockError::not_found("Usuário"));
    }
    if current.is_open() && current.book_id != input.book_id {
        take_copy(&mut db, &input.book_id)?;
        give_back(&mut db, &current.book_id);
    }

    let now = Utc::now();
    let loan = find_mut(&mut db, &id)?;
    loan.user_id = input.user_id;
    loan.book_id = input.book_id;
    loan.loan_date = loan_date;
    loan.due_date = input.due_date;
    loan.notes = input.notes;
    loan.updated_at = now;
    if loan.is_open() && loan.due_date >= now && loan.status != RENEWED {
        loan.status = PENDING.to_string();
    }
    let loan = loan.clone();
    Ok(ok(present(&db, &loan)))
}

pub async fn delete(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let loan = find(&db, &id)?.clone();
    if loan.is_open() {
        give_back(&mut db, &loan.book_id);
    }
    db.loans.retain(|l| l.id != id);
    Ok(done("Empréstimo removido"))
}

pub async fn return_loan(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let now = Utc::now();
    let mut db = db.write().await;
    let loan = find_mut(&mut db, &id)?;
    if !loan.is_open() {
        return Err(MockError::BadRequest("Empréstimo já devolvido".to_string()));
    }
    loan.return_date = Some(now);
    loan.fine = late_fee(loan.due_date, now);
    loan.status = RETURNED.to_string();
    loan.updated_at = now;
    let loan = loan.clone();
    give_back(&mut db, &loan.book_id);
    tracing::info!(loan = %loan.id, fine = loan.fine, "loan returned");
    Ok(ok(present(&db, &loan)))
}

pub async fn renew(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let loan = find_mut(&mut db, &id)?;
    if !loan.is_open() {
        return Err(MockError::BadRequest("Empréstimo já devolvido".to_string()));
    }
    if loan.renewals >= MAX_RENEWALS {
        return Err(MockError::BadRequest(
            "Limite de renovações atingido".to_string(),
        ));
    }
    loan.due_date += Duration::days(RENEWAL_DAYS);
    loan.renewals += 1;
    loan.status = RENEWED.to_string();
    loan.updated_at = Utc::now();
    let loan = loan.clone();
    Ok(ok(present(&db, &loan)))
}

pub async fn pay_fine(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let loan = find_mut(&mut db, &id)?;
    if loan.fine <= 0.0 {
        return Err(MockError::BadRequest("Nenhuma multa pendente".to_string()));
    }
    loan.fine = 0.0;
    loan.updated_at = Utc::now();
    let loan = loan.clone();
    Ok(ok(present(&db, &loan)))
}

/// Fee for a return at `returned` against `due`: one charge per started day.
pub fn late_fee(due: DateTime<Utc>, returned: DateTime<Utc>) -> f64 {
    let late_ms = (returned - due).num_milliseconds();
    if late_ms <= 0 {
        return 0.0;
    }
    let day_ms = Duration::days(1).num_milliseconds();
    let days = (late_ms + day_ms - 1) / day_ms;
    days as f64 * FINE_PER_DAY
}

fn check_dates(loan_date: DateTime<Utc>, due_date: DateTime<Utc>) -> MockResult<()> {
    if due_date < loan_date {
        return Err(MockError::BadRequest(
            "Data de devolução anterior à data do empréstimo".to_string(),
        ));
    }
    Ok(())
}

fn find<'a>(db: &'a Db, id: &str) -> MockResult<&'a Loan> {
    db.loans
        .iter()
        .find(|l| l.id == id)
        .ok_or_else(|| MockError::not_found("Empréstimo"))
}

fn find_mut<'a>(db: &'a mut Db, id: &str) -> MockResult<&'a mut Loan> {
    db.loans
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or_else(|| MockError::not_found("Empréstimo"))
}

fn take_copy(db: &mut Db, book_id: &str) -> MockResult<()> {
    let book = db
        .books
        .iter_mut()
        .find(|b| b.id == book_id)
        .ok_or_else(|| MockError::not_found("Livro"))?;
    if book.available == 0 {
        return Err(MockError::BadRequest(
            "Livro indisponível para empréstimo".to_string(),
        ));
    }
    book.available -= 1;
    Ok(())
}

fn give_back(db: &mut Db, book_id: &str) {
    if let Some(book) = db.books.iter_mut().find(|b| b.id == book_id) {
        book.available = (book.available + 1).min(book.total);
    }
}

/// A loan as served: status brought up to date, user and book embedded when
/// they still exist.
fn present(db: &Db, loan: &Loan) -> Value {
    let mut loan = loan.clone();
    loan.refresh_status(Utc::now());
    let mut value = serde_json::to_value(&loan).unwrap_or(Value::Null);
    if let Some(user) = db.users.iter().find(|u| u.id == loan.user_id) {
        value["usuario"] = serde_json::to_value(user).unwrap_or(Value::Null);
    }
    if let Some(book) = db.books.iter().find(|b| b.id == loan.book_id) {
        value["livro"] = serde_json::to_value(book).unwrap_or(Value::Null);
    }
    value
}

fn present_all<'a>(db: &Db, loans: impl Iterator<Item = &'a Loan>) -> Vec<Value> {
    loans.map(|l| present(db, l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_fee_charges_per_started_day() {
        let due = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(late_fee(due, due - Duration::hours(5)), 0.0);
        assert_eq!(late_fee(due, due), 0.0);
        assert_eq!(late_fee(due, due + Duration::hours(1)), FINE_PER_DAY);
        assert_eq!(late_fee(due, due + Duration::days(3)), 3.0 * FINE_PER_DAY);
    }
}
