//! Role and permission model.
//!
//! # Design
//! A single model decides access: every role maps to a fixed set of
//! `area:action` permissions, and callers ask for a permission, never for a
//! role. Page-level gates ("staff only") are expressed as the permission the
//! page needs. Roles are parsed case-insensitively; a role this client does
//! not know is preserved verbatim but grants nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::User;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Librarian,
    Reader,
    Community,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "bibliotecario",
            Role::Reader => "leitor",
            Role::Community => "comunidade",
            Role::Other(name) => name,
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN,
            Role::Librarian => LIBRARIAN,
            Role::Reader | Role::Community => PATRON,
            Role::Other(_) => &[],
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "bibliotecario" => Role::Librarian,
            "leitor" => Role::Reader,
            "comunidade" => Role::Community,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Books,
    Categories,
    Users,
    Loans,
    Settings,
    Profile,
}

impl Area {
    fn as_str(self) -> &'static str {
        match self {
            Area::Books => "livros",
            Area::Categories => "categorias",
            Area::Users => "usuarios",
            Area::Loans => "emprestimos",
            Area::Settings => "configuracoes",
            Area::Profile => "perfil",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

/// An `area:action` grant, rendered as e.g. `livros:write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub area: Area,
    pub action: Action,
}

impl Permission {
    pub const fn new(area: Area, action: Action) -> Self {
        Self { area, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.area.as_str(), self.action.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission `{0}`")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownPermission(s.to_string());
        let (area, action) = s.split_once(':').ok_or_else(unknown)?;
        let area = match area {
            "livros" => Area::Books,
            "categorias" => Area::Categories,
            "usuarios" => Area::Users,
            "emprestimos" => Area::Loans,
            "configuracoes" => Area::Settings,
            "perfil" => Area::Profile,
            _ => return Err(unknown()),
        };
        let action = match action {
            "read" => Action::Read,
            "write" => Action::Write,
            "delete" => Action::Delete,
            _ => return Err(unknown()),
        };
        Ok(Permission::new(area, action))
    }
}

use Action::{Delete, Read, Write};
use Area::{Books, Categories, Loans, Profile, Settings, Users};

const ADMIN: &[Permission] = &[
    Permission::new(Books, Read),
    Permission::new(Books, Write),
    Permission::new(Books, Delete),
    Permission::new(Categories, Read),
    Permission::new(Categories, Write),
    Permission::new(Categories, Delete),
    Permission::new(Users, Read),
    Permission::new(Users, Write),
    Permission::new(Users, Delete),
    Permission::new(Loans, Read),
    Permission::new(Loans, Write),
    Permission::new(Loans, Delete),
    Permission::new(Settings, Read),
    Permission::new(Settings, Write),
    Permission::new(Profile, Read),
    Permission::new(Profile, Write),
];

// Librarians run the circulation desk but cannot delete accounts or touch
// settings.
const LIBRARIAN: &[Permission] = &[
    Permission::new(Books, Read),
    Permission::new(Books, Write),
    Permission::new(Books, Delete),
    Permission::new(Categories, Read),
    Permission::new(Categories, Write),
    Permission::new(Categories, Delete),
    Permission::new(Users, Read),
    Permission::new(Users, Write),
    Permission::new(Loans, Read),
    Permission::new(Loans, Write),
    Permission::new(Loans, Delete),
    Permission::new(Profile, Read),
    Permission::new(Profile, Write),
];

const PATRON: &[Permission] = &[
    Permission::new(Books, Read),
    Permission::new(Categories, Read),
    Permission::new(Profile, Read),
    Permission::new(Profile, Write),
];

/// Whether `user` holds `permission`. Anonymous users and users without a
/// role hold nothing.
pub fn check_permission(user: Option<&User>, permission: Permission) -> bool {
    user.and_then(|u| u.role.as_ref())
        .is_some_and(|role| role.allows(permission))
}

pub fn has_any_permission(user: Option<&User>, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| check_permission(user, *p))
}

pub fn user_permissions(user: Option<&User>) -> &'static [Permission] {
    user.and_then(|u| u.role.as_ref())
        .map(Role::permissions)
        .unwrap_or(&[])
}
