use super::{check_status, decode, encode, LibraryClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Credentials, LoginResponse, PasswordChange, Resource, User};

/// Which probe an auth check sent, so the response can be read accordingly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCheckRequest {
    /// Refetch the cached user by id.
    Refresh(String),
    /// No usable cached user: only confirm the token is still accepted.
    Probe,
}

impl LibraryClient {
    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, format!("{}/login", User::ENDPOINT), credentials)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        check_status(&response, "login")?;
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(format!("login: {e}")))
    }

    /// Self-registration goes through the plain user collection.
    pub fn build_register(&self, user: &User) -> Result<HttpRequest, ApiError> {
        self.build_create::<User>(user)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<User, ApiError> {
        self.parse_one::<User>(response)
    }

    pub fn build_auth_check(&self, cached_user: Option<&User>) -> (AuthCheckRequest, HttpRequest) {
        match cached_user.and_then(|u| u.id.as_deref()) {
            Some(id) => (AuthCheckRequest::Refresh(id.to_string()), self.build_get::<User>(id)),
            None => (
                AuthCheckRequest::Probe,
                self.request(HttpMethod::Get, format!("{}?limit=1", User::ENDPOINT), None),
            ),
        }
    }

    /// `Some(user)` after a refresh; `None` when the probe only confirmed the
    /// token.
    pub fn parse_auth_check(
        &self,
        kind: &AuthCheckRequest,
        response: HttpResponse,
    ) -> Result<Option<User>, ApiError> {
        match kind {
            AuthCheckRequest::Refresh(_) => decode(response, "auth check").map(Some),
            AuthCheckRequest::Probe => check_status(&response, "auth check").map(|()| None),
        }
    }

    pub fn build_change_password(
        &self,
        user_id: &str,
        change: &PasswordChange,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            format!("{}/{}/senha", User::ENDPOINT, encode(user_id)),
            change,
        )
    }

    pub fn parse_change_password(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, "password change")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LibraryClient {
        LibraryClient::new("http://localhost:5000")
    }

    #[test]
    fn build_login_sends_email_and_senha() {
        let req = client()
            .build_login(&Credentials::new("ana@example.com", "Abcdef1@"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:5000/api/usuarios/login");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "ana@example.com");
        assert_eq!(body["senha"], "Abcdef1@");
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn parse_login_reads_token_and_user() {
        let resp = HttpResponse::new(
            200,
            r#"{"token":"jwt","usuario":{"_id":"u1","nome":"Ana","email":"a@x.io","tipo":"admin"}}"#,
        );
        let login = client().parse_login(resp).unwrap();
        assert_eq!(login.token, "jwt");
        assert_eq!(login.user.unwrap().id.as_deref(), Some("u1"));
    }

    #[test]
    fn bad_credentials_surface_server_message() {
        let resp = HttpResponse::new(400, r#"{"message":"Credenciais inválidas"}"#);
        let err = client().parse_login(resp).unwrap_err();
        assert_eq!(err.to_string(), "Credenciais inválidas");
    }

    #[test]
    fn auth_check_refreshes_known_user() {
        let user = User {
            id: Some("u7".into()),
            ..User::default()
        };
        let (kind, req) = client().with_token("t").build_auth_check(Some(&user));
        assert_eq!(kind, AuthCheckRequest::Refresh("u7".into()));
        assert_eq!(req.path, "http://localhost:5000/api/usuarios/u7");

        let resp = HttpResponse::new(200, r#"{"data":{"_id":"u7","nome":"Rui","email":"r@x.io"}}"#);
        let refreshed = client().parse_auth_check(&kind, resp).unwrap();
        assert_eq!(refreshed.unwrap().name, "Rui");
    }

    #[test]
    fn auth_check_probes_without_user() {
        let (kind, req) = client().with_token("t").build_auth_check(None);
        assert_eq!(kind, AuthCheckRequest::Probe);
        assert_eq!(req.path, "http://localhost:5000/api/usuarios?limit=1");
        let resp = HttpResponse::new(200, "[]");
        assert_eq!(client().parse_auth_check(&kind, resp).unwrap(), None);
    }

    #[test]
    fn build_change_password_patches_senha() {
        let change = PasswordChange {
            current: "Old1@pass".into(),
            new: "New1@pass".into(),
        };
        let req = client().build_change_password("u1", &change).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:5000/api/usuarios/u1/senha");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["senhaAtual"], "Old1@pass");
        assert_eq!(body["novaSenha"], "New1@pass");
    }
}
