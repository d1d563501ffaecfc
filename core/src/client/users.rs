use serde_json::json;

use super::{encode, LibraryClient};
use crate::auth::Role;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{Resource, User};

impl LibraryClient {
    /// Activate or deactivate an account. Accounts are toggled rather than
    /// deleted. Parse with `parse_one::<User>`.
    pub fn build_set_user_status(&self, user_id: &str, active: bool) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            format!("{}/{}/status", User::ENDPOINT, encode(user_id)),
            &json!({ "ativo": active }),
        )
    }

    /// Parse with `parse_one::<User>`.
    pub fn build_set_user_role(&self, user_id: &str, role: &Role) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            format!("{}/{}/tipo", User::ENDPOINT, encode(user_id)),
            &json!({ "tipo": role.as_str() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LibraryClient {
        LibraryClient::new("http://localhost:5000")
    }

    #[test]
    fn build_set_user_status_sends_ativo() {
        let req = client().build_set_user_status("u1", false).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:5000/api/usuarios/u1/status");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "ativo": false }));
    }

    #[test]
    fn build_set_user_role_sends_backend_role_name() {
        let req = client().build_set_user_role("u1", &Role::Librarian).unwrap();
        assert_eq!(req.path, "http://localhost:5000/api/usuarios/u1/tipo");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "tipo": "bibliotecario" }));
    }
}
