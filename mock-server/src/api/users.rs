use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::{created, done, ok, required, Authenticated};
use crate::{
    error::{MockError, MockResult},
    models::{LoginInput, Paging, PasswordInput, RoleInput, StatusInput, User, UserInput},
    new_id, AppState,
};

const ROLES: [&str; 4] = ["admin", "bibliotecario", "leitor", "comunidade"];

pub async fn login(
    State(db): State<AppState>,
    Json(input): Json<LoginInput>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let user = db
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(&input.email) && u.password == input.password)
        .cloned()
        .ok_or_else(|| MockError::Unauthorized("Credenciais inválidas".to_string()))?;
    if !user.active {
        return Err(MockError::Forbidden("Usuário inativo".to_string()));
    }
    let token = new_id();
    db.sessions.insert(token.clone(), user.id.clone());
    tracing::info!(user = %user.id, "login");
    Ok(Json(json!({ "sucesso": true, "token": token, "usuario": user })))
}

pub async fn list(
    _auth: Authenticated,
    State(db): State<AppState>,
    Query(paging): Query<Paging>,
) -> Json<Value> {
    let db = db.read().await;
    ok(paging.apply(&db.users))
}

pub async fn get_one(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let db = db.read().await;
    let user = db
        .users
        .iter()
        .find(|u| u.id == id)
        .ok_or_else(|| MockError::not_found("Usuário"))?;
    Ok(ok(user))
}

/// Open to anonymous callers: this is also the self-registration endpoint.
pub async fn create(
    State(db): State<AppState>,
    Json(input): Json<UserInput>,
) -> MockResult<(StatusCode, Json<Value>)> {
    required(&input.name, "Nome é obrigatório")?;
    required(&input.email, "Email é obrigatório")?;
    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| MockError::BadRequest("Senha é obrigatória".to_string()))?;
    let role = checked_role(input.role.as_deref().unwrap_or("leitor"))?;

    let mut db = db.write().await;
    if db.users.iter().any(|u| u.email.eq_ignore_ascii_case(&input.email)) {
        return Err(MockError::BadRequest("Email já cadastrado".to_string()));
    }
    let now = Utc::now();
    let user = User {
        id: new_id(),
        name: input.name,
        email: input.email,
        password,
        role,
        document: input.document,
        phone: input.phone,
        address: input.address,
        active: input.active.unwrap_or(true),
        birth_date: input.birth_date,
        created_at: now,
        updated_at: now,
    };
    db.users.push(user.clone());
    Ok(created(user))
}

/// A blank or missing `senha` keeps the current password.
pub async fn update(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> MockResult<Json<Value>> {
    required(&input.name, "Nome é obrigatório")?;
    required(&input.email, "Email é obrigatório")?;
    let role = input.role.as_deref().map(checked_role).transpose()?;

    let mut db = db.write().await;
    if db
        .users
        .iter()
        .any(|u| u.id != id && u.email.eq_ignore_ascii_case(&input.email))
    {
        return Err(MockError::BadRequest("Email já cadastrado".to_string()));
    }
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| MockError::not_found("Usuário"))?;
    user.name = input.name;
    user.email = input.email;
    if let Some(password) = input.password.filter(|p| !p.is_empty()) {
        user.password = password;
    }
    if let Some(role) = role {
        user.role = role;
    }
    user.document = input.document;
    user.phone = input.phone;
    user.address = input.address;
    if let Some(active) = input.active {
        user.active = active;
    }
    user.birth_date = input.birth_date;
    user.updated_at = Utc::now();
    Ok(ok(user.clone()))
}

pub async fn delete(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    if db.loans.iter().any(|l| l.user_id == id && l.is_open()) {
        return Err(MockError::BadRequest(
            "Usuário possui empréstimos em aberto".to_string(),
        ));
    }
    let before = db.users.len();
    db.users.retain(|u| u.id != id);
    if db.users.len() == before {
        return Err(MockError::not_found("Usuário"));
    }
    db.sessions.retain(|_, user_id| *user_id != id);
    Ok(done("Usuário removido"))
}

/// Deactivating an account also revokes its tokens.
pub async fn set_status(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> MockResult<Json<Value>> {
    let mut db = db.write().await;
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| MockError::not_found("Usuário"))?;
    user.active = input.active;
    user.updated_at = Utc::now();
    let user = user.clone();
    if !user.active {
        db.sessions.retain(|_, user_id| *user_id != id);
    }
    Ok(ok(user))
}

pub async fn set_role(
    auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RoleInput>,
) -> MockResult<Json<Value>> {
    let role = checked_role(&input.role)?;
    let mut db = db.write().await;
    let caller_is_admin = db
        .users
        .iter()
        .any(|u| u.id == auth.user_id && u.role == "admin");
    if !caller_is_admin {
        return Err(MockError::Forbidden(
            "Apenas administradores podem alterar o tipo".to_string(),
        ));
    }
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| MockError::not_found("Usuário"))?;
    user.role = role;
    user.updated_at = Utc::now();
    Ok(ok(user.clone()))
}

pub async fn change_password(
    _auth: Authenticated,
    State(db): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PasswordInput>,
) -> MockResult<Json<Value>> {
    required(&input.new, "Nova senha é obrigatória")?;
    let mut db = db.write().await;
    let user = db
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| MockError::not_found("Usuário"))?;
    if user.password != input.current {
        return Err(MockError::BadRequest("Senha atual incorreta".to_string()));
    }
    user.password = input.new;
    user.updated_at = Utc::now();
    Ok(done("Senha alterada"))
}

fn checked_role(role: &str) -> MockResult<String> {
    let role = role.to_lowercase();
    if ROLES.contains(&role.as_str()) {
        Ok(role)
    } else {
        Err(MockError::BadRequest(format!("Tipo de usuário inválido: {role}")))
    }
}
