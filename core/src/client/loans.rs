use super::{encode, LibraryClient};
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{Loan, Resource};

impl LibraryClient {
    /// Mark a loan returned. The server frees the copy and settles any fine.
    /// Parse with `parse_one::<Loan>`.
    pub fn build_return_loan(&self, loan_id: &str) -> HttpRequest {
        self.loan_action(loan_id, "devolver")
    }

    /// Ask the server to extend the due date. The server picks the new date.
    /// Parse with `parse_one::<Loan>`.
    pub fn build_renew_loan(&self, loan_id: &str) -> HttpRequest {
        self.loan_action(loan_id, "renovar")
    }

    /// Parse with `parse_one::<Loan>`.
    pub fn build_pay_fine(&self, loan_id: &str) -> HttpRequest {
        self.loan_action(loan_id, "multa/pagar")
    }

    /// Parse with `parse_list::<Loan>`.
    pub fn build_overdue_loans(&self) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/atrasados", Loan::ENDPOINT), None)
    }

    /// Parse with `parse_list::<Loan>`.
    pub fn build_loans_by_user(&self, user_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{}/usuario/{}", Loan::ENDPOINT, encode(user_id)),
            None,
        )
    }

    /// Parse with `parse_list::<Loan>`.
    pub fn build_loans_by_book(&self, book_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{}/livro/{}", Loan::ENDPOINT, encode(book_id)),
            None,
        )
    }

    fn loan_action(&self, loan_id: &str, action: &str) -> HttpRequest {
        self.request(
            HttpMethod::Patch,
            format!("{}/{}/{action}", Loan::ENDPOINT, encode(loan_id)),
            None,
        )
    }
}
