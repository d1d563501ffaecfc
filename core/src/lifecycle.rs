//! Loan lifecycle rules and availability bookkeeping.
//!
//! # Design
//! Everything here is a pure function of a record and the current instant.
//! The server remains the authority: these rules only decide what to show and
//! which actions to offer. Renewal is capped at `MAX_RENEWALS` on the client
//! as a UI gate; fines are computed by the server and only formatted here.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::ApiError;
use crate::types::{Book, Loan, LoanStatus};

pub const MAX_RENEWALS: u32 = 2;
/// Default loan period used to prefill new loans.
pub const DEFAULT_LOAN_DAYS: i64 = 7;
/// Extension the backend applies on renewal. Informational only; the
/// server's returned due date is what gets displayed.
pub const RENEWAL_DAYS: i64 = 7;

const DAY_MS: i64 = 24 * 60 * 60 * 1_000;

/// Whole days from `now` until `due`, rounded up.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff = (due - now).num_milliseconds();
    let days = diff.div_euclid(DAY_MS);
    if diff.rem_euclid(DAY_MS) == 0 {
        days
    } else {
        days + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
    Danger,
}

/// Where a loan stands relative to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Remaining(i64),
    DueToday,
    Overdue(i64),
}

impl DueState {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d > 0 => DueState::Remaining(d),
            0 => DueState::DueToday,
            d => DueState::Overdue(-d),
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DueState::Remaining(_) => Severity::Normal,
            DueState::DueToday => Severity::Warning,
            DueState::Overdue(_) => Severity::Danger,
        }
    }
}

impl fmt::Display for DueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: i64| if n == 1 { "day" } else { "days" };
        match *self {
            DueState::Remaining(n) => write!(f, "{n} {} remaining", plural(n)),
            DueState::DueToday => f.write_str("due today"),
            DueState::Overdue(n) => write!(f, "overdue by {n} {}", plural(n)),
        }
    }
}

impl Loan {
    /// The server's status when it sent one; otherwise derived from the
    /// return and due dates.
    pub fn effective_status(&self, now: DateTime<Utc>) -> LoanStatus {
        if let Some(status) = self.status {
            return status;
        }
        if self.return_date.is_some() {
            LoanStatus::Returned
        } else if self.due_date < now {
            LoanStatus::Overdue
        } else if self.renewal_count() > 0 {
            LoanStatus::Renewed
        } else {
            LoanStatus::Pending
        }
    }

    pub fn due_state(&self, now: DateTime<Utc>) -> DueState {
        DueState::from_days(days_until(self.due_date, now))
    }

    pub fn renewal_count(&self) -> u32 {
        self.renewals.unwrap_or(0)
    }

    /// Whether a "return" action should be offered.
    pub fn can_finalize(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now).is_open()
    }

    /// Whether a "renew" action should be offered.
    pub fn can_renew(&self, now: DateTime<Utc>) -> bool {
        self.can_finalize(now) && self.renewal_count() < MAX_RENEWALS
    }

    /// The due date the backend is expected to assign on renewal.
    pub fn expected_renewal_due_date(&self) -> DateTime<Utc> {
        self.due_date + Duration::days(RENEWAL_DAYS)
    }

    /// A positive fine on a loan that is overdue or already returned.
    pub fn outstanding_fine(&self, now: DateTime<Utc>) -> Option<f64> {
        let fine = self.fine.filter(|f| *f > 0.0)?;
        match self.effective_status(now) {
            LoanStatus::Overdue | LoanStatus::Returned => Some(fine),
            LoanStatus::Pending | LoanStatus::Renewed => None,
        }
    }
}

/// Monetary amount with two decimals, e.g. `R$ 12.50`.
pub fn format_fine(amount: f64) -> String {
    format!("R$ {amount:.2}")
}

/// Prefilled due date for a new loan.
pub fn default_due_date(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(DEFAULT_LOAN_DAYS)
}

/// Whether the loan form creates a loan or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Advisory gate for submitting the loan form. Creating a loan needs a free
/// copy; editing one consumes nothing and always passes.
pub fn check_loan_availability(book: &Book, mode: FormMode) -> Result<(), ApiError> {
    match mode {
        FormMode::Edit => Ok(()),
        FormMode::Create if book.is_available() => Ok(()),
        FormMode::Create => Err(ApiError::BookUnavailable),
    }
}

/// A loan mutation as it affects the lent book's copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanEvent {
    Created,
    Returned,
    Renewed,
    /// Deleting an open loan gives its copy back; deleting a returned one
    /// changes nothing.
    Deleted { was_open: bool },
}

impl LoanEvent {
    pub fn availability_delta(self) -> i64 {
        match self {
            LoanEvent::Created => -1,
            LoanEvent::Returned => 1,
            LoanEvent::Deleted { was_open: true } => 1,
            LoanEvent::Deleted { was_open: false } | LoanEvent::Renewed => 0,
        }
    }
}

impl Book {
    /// Adjust the available counter for `event`, keeping it within
    /// `0..=total`. Books with no known counter are left alone.
    pub fn apply_loan_event(&mut self, event: LoanEvent) {
        let Some(available) = self.available else {
            return;
        };
        let mut next = (i64::from(available) + event.availability_delta()).max(0);
        if let Some(total) = self.total {
            next = next.min(i64::from(total));
        }
        self.available = Some(u32::try_from(next).unwrap_or(u32::MAX));
    }
}
