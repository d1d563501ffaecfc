//! Dashboard figures computed from the cached collections.

use serde::Serialize;

use crate::store::Stores;
use crate::types::{Loan, LoanStatus};

pub const RECENT_LOANS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_titles: usize,
    pub available_copies: u64,
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub active_users: usize,
    pub categories: usize,
    pub recent_loans: Vec<Loan>,
}

impl DashboardStats {
    /// Loans count by the status the server reported. Loans without one are
    /// counted in neither bucket.
    pub fn compute(stores: &Stores) -> Self {
        let loans = stores.loans.items();
        let count_status = |wanted: &[LoanStatus]| {
            loans
                .iter()
                .filter(|l| l.status.is_some_and(|s| wanted.contains(&s)))
                .count()
        };

        let mut recent: Vec<Loan> = loans.to_vec();
        // Newest first; undated loans sink to the bottom.
        recent.sort_by(|a, b| b.loan_date.cmp(&a.loan_date));
        recent.truncate(RECENT_LOANS);

        Self {
            total_titles: stores.books.items().len(),
            available_copies: stores
                .books
                .items()
                .iter()
                .map(|b| u64::from(b.available_copies()))
                .sum(),
            active_loans: count_status(&[LoanStatus::Pending, LoanStatus::Renewed]),
            overdue_loans: count_status(&[LoanStatus::Overdue]),
            active_users: stores.users.items().iter().filter(|u| u.is_active()).count(),
            categories: stores.categories.items().len(),
            recent_loans: recent,
        }
    }
}
