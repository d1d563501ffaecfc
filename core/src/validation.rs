//! Form-level validation that runs before anything is sent.
//!
//! Field rules are declared on the records with `validator`; this module adds
//! the rules that need more than one field (password confirmation) and
//! collects everything into `FieldErrors`, keyed by field, for inline display.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::types::User;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const PASSWORD_SPECIALS: &str = "@#$%^&+=!";

/// Per-field validation messages. Errors that concern the whole form are
/// filed under `__all__`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            for err in list.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                if field == "__all__" {
                    f.write_str(message)?;
                } else {
                    write!(f, "{field}: {message}")?;
                }
            }
        }
        Ok(())
    }
}

/// Run a record's declared rules.
pub fn validate<T: Validate>(record: &T) -> Result<(), FieldErrors> {
    record.validate().map_err(FieldErrors::from)
}

/// First unmet password rule, if any.
pub fn password_problem(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain a digit");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Some("Password must contain one of @#$%^&+=!");
    }
    None
}

pub(crate) fn strong_password(password: &str) -> Result<(), ValidationError> {
    match password_problem(password) {
        Some(message) => {
            let mut err = ValidationError::new("password");
            err.message = Some(Cow::from(message));
            Err(err)
        }
        None => Ok(()),
    }
}

/// Password strength on a 0-100 scale.
pub fn password_strength(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }
    let len = password.chars().count();
    let mut score = (len * 4).min(40);
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 10;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 10;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 15;
    }
    if password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        score += 15;
    }
    if len > MIN_PASSWORD_LEN {
        score += ((len - MIN_PASSWORD_LEN) * 2).min(10);
    }
    score.min(100) as u8
}

pub fn strength_label(strength: u8) -> &'static str {
    match strength {
        0..=29 => "very weak",
        30..=49 => "weak",
        50..=69 => "fair",
        70..=89 => "strong",
        _ => "very strong",
    }
}

/// Registration form: the user's own rules plus a mandatory, matching
/// password confirmation.
pub fn check_registration(user: &User, confirmation: &str) -> Result<(), FieldErrors> {
    let mut errors = validate(user).err().unwrap_or_default();
    match user.password.as_deref() {
        None | Some("") => errors.add("password", "Password is required"),
        Some(password) if password != confirmation => {
            errors.add("password_confirmation", "Passwords do not match")
        }
        Some(_) => {}
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(password: &str) -> User {
        User {
            name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            password: Some(password.into()),
            document: "123.456.789-00".into(),
            phone: "11 99999-0000".into(),
            ..User::default()
        }
    }

    #[test]
    fn password_rules_are_checked_in_order() {
        assert!(password_problem("Ab1!").unwrap().contains("8 characters"));
        assert!(password_problem("abcdefg1!").unwrap().contains("uppercase"));
        assert!(password_problem("ABCDEFG1!").unwrap().contains("lowercase"));
        assert!(password_problem("Abcdefgh!").unwrap().contains("digit"));
        assert!(password_problem("Abcdefg12").unwrap().contains("@#$%^&+=!"));
        assert!(password_problem("Abcdef1@").is_none());
    }

    #[test]
    fn strength_scores_and_labels() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abc"), 22);
        assert_eq!(strength_label(password_strength("abc")), "very weak");
        // 40 (length) + 10 + 10 + 15 + 15 + 8 (four extra chars)
        assert_eq!(password_strength("Abcdefgh12!@"), 98);
        assert_eq!(strength_label(98), "very strong");
    }

    #[test]
    fn registration_rejects_mismatched_confirmation() {
        let errors = check_registration(&registration("Abcdef1@"), "Abcdef1#").unwrap_err();
        assert_eq!(errors.get("password_confirmation"), ["Passwords do not match"]);
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let mut user = registration("weak");
        user.email = "not-an-email".into();
        user.name.clear();
        let errors = check_registration(&user, "weak").unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, ["email", "name", "password"]);
    }

    #[test]
    fn registration_requires_a_password() {
        let mut user = registration("x");
        user.password = None;
        let errors = check_registration(&user, "").unwrap_err();
        assert_eq!(errors.get("password"), ["Password is required"]);
    }

    #[test]
    fn valid_registration_passes() {
        assert!(check_registration(&registration("Abcdef1@"), "Abcdef1@").is_ok());
    }

    #[test]
    fn display_joins_messages() {
        let mut errors = FieldErrors::new();
        errors.add("title", "Title is required");
        errors.add("__all__", "Dates are inconsistent");
        assert_eq!(errors.to_string(), "Dates are inconsistent; title: Title is required");
    }
}
