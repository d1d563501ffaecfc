use super::{encode, LibraryClient};
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{Book, Category, Resource};

impl LibraryClient {
    /// Free-text catalog search. Parse with `parse_list::<Book>`.
    pub fn build_search_books(&self, term: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{}/busca?q={}", Book::ENDPOINT, encode(term.trim())),
            None,
        )
    }

    /// Books filed under a category. Parse with `parse_list::<Book>`.
    pub fn build_books_by_category(&self, category_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{}/{}/livros", Category::ENDPOINT, encode(category_id)),
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;

    fn client() -> LibraryClient {
        LibraryClient::new("http://localhost:5000")
    }

    #[test]
    fn build_search_encodes_term() {
        let req = client().build_search_books("  machado de assis ");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.path,
            "http://localhost:5000/api/livros/busca?q=machado%20de%20assis"
        );
    }

    #[test]
    fn build_books_by_category_nests_under_category() {
        let req = client().build_books_by_category("c1");
        assert_eq!(req.path, "http://localhost:5000/api/categorias/c1/livros");
    }

    #[test]
    fn search_results_parse_as_books() {
        let resp = HttpResponse::new(
            200,
            r#"{"sucesso":true,"data":[{"_id":"b1","titulo":"Iracema","autor":"Alencar","isbn":"1","disponiveis":0}]}"#,
        );
        let books = client().parse_list::<Book>(resp).unwrap();
        assert_eq!(books.len(), 1);
        assert!(!books[0].is_available());
    }
}
