use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_auth::{Role, UserView};
use warden_core::{Email, UserId};
use warden_infra::{CreateUser, UpdateUser};

use crate::app::errors::json_error;

const MIN_NAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;

/// `roles` accepts a single name or a list of names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RoleNames {
    One(String),
    Many(Vec<String>),
}

impl RoleNames {
    /// Names are handed to the pipeline as-is; it normalises and checks them
    /// against the role catalog.
    fn into_roles(self) -> Vec<Role> {
        match self {
            RoleNames::One(name) => vec![Role::new(name)],
            RoleNames::Many(names) => names.into_iter().map(Role::new).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub roles: Option<RoleNames>,
}

impl CreateUserRequest {
    pub fn into_operation(self) -> Result<CreateUser, axum::response::Response> {
        Ok(CreateUser {
            name: person_name("name", &self.name)?,
            lastname: person_name("lastname", &self.lastname)?,
            email: email(&self.email)?,
            password: password("password", self.password)?,
            confirm_password: password("confirmPassword", self.confirm_password)?,
            roles: self.roles.map(RoleNames::into_roles),
        })
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub roles: Option<RoleNames>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn into_changes(self) -> Result<UpdateUser, axum::response::Response> {
        Ok(UpdateUser {
            name: self.name.map(|v| person_name("name", &v)).transpose()?,
            lastname: self.lastname.map(|v| person_name("lastname", &v)).transpose()?,
            email: self.email.map(|v| email(&v)).transpose()?,
            password: self.password.map(|v| password("password", v)).transpose()?,
            confirm_password: self
                .confirm_password
                .map(|v| password("confirmPassword", v))
                .transpose()?,
            roles: self.roles.map(RoleNames::into_roles),
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListQuery {
    pub fn validate(&self) -> Result<(), axum::response::Response> {
        if self.limit == Some(0) {
            return Err(invalid("limit must be a positive number"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserView> for UserResponse {
    fn from(view: UserView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            lastname: view.lastname,
            email: view.email,
            roles: view.roles,
            is_active: view.is_active,
            created_at: view.created_at,
            updated_at: view.updated_at,
        }
    }
}

pub fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse::<UserId>()
        .map_err(|_| invalid(format!("{raw} is not a valid user id")))
}

fn invalid(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Trimmed, at least two characters, no inner whitespace; returned
/// capitalised ("rICHARD" becomes "Richard").
fn person_name(field: &str, raw: &str) -> Result<String, axum::response::Response> {
    let value = raw.trim();
    if value.chars().count() < MIN_NAME_LEN {
        return Err(invalid(format!("{field} must be at least {MIN_NAME_LEN} characters")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(format!("the {field} must not contain spaces")));
    }
    Ok(capitalize(value))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn email(raw: &str) -> Result<Email, axum::response::Response> {
    Email::parse(raw).map_err(|e| invalid(e.to_string()))
}

fn password(field: &str, value: String) -> Result<String, axum::response::Response> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!("{field} must be at least {MIN_PASSWORD_LEN} characters")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(format!("{field} must not contain spaces")));
    }
    let upper = value.chars().any(char::is_uppercase);
    let lower = value.chars().any(char::is_lowercase);
    let digit_or_symbol = value.chars().any(|c| c.is_ascii_digit() || !c.is_alphanumeric());
    if !(upper && lower && digit_or_symbol) {
        return Err(invalid(format!(
            "{field} must contain an upper-case letter, a lower-case letter and a number or symbol"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateUserRequest {
        serde_json::from_value(serde_json::json!({
            "name": "rICHARD",
            "lastname": "kendy",
            "email": "  Richard@Example.COM ",
            "password": "Test123##",
            "confirmPassword": "Test123##",
            "roles": "admin"
        }))
        .unwrap()
    }

    #[test]
    fn create_request_is_normalised() {
        let op = create_request().into_operation().unwrap();
        assert_eq!(op.name, "Richard");
        assert_eq!(op.lastname, "Kendy");
        assert_eq!(op.email.as_str(), "richard@example.com");
        assert_eq!(op.roles, Some(vec![Role::new("admin")]));
    }

    #[test]
    fn roles_accept_a_list() {
        let req: UpdateUserRequest = serde_json::from_value(serde_json::json!({
            "roles": ["user", "ADMIN"],
            "isActive": false
        }))
        .unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.roles.map(|r| r.len()), Some(2));
        assert_eq!(changes.is_active, Some(false));
    }

    #[test]
    fn names_with_spaces_or_too_short_are_rejected() {
        assert!(person_name("name", "Mary Ann").is_err());
        assert!(person_name("name", "A").is_err());
        assert_eq!(person_name("name", "  ana ").unwrap(), "Ana");
    }

    #[test]
    fn weak_passwords_are_rejected() {
        for weak in ["short", "alllowercase1", "ALLUPPER1", "NoDigitsHere", "Has Space1"] {
            assert!(password("password", weak.to_string()).is_err(), "{weak}");
        }
        assert!(password("password", "Test123##".to_string()).is_ok());
        assert!(password("password", "Test##ab".to_string()).is_ok());
    }

    #[test]
    fn zero_limit_is_invalid() {
        let query = ListQuery { limit: Some(0), offset: None };
        assert_eq!(query.validate().unwrap_err().status(), StatusCode::BAD_REQUEST);
    }
}
