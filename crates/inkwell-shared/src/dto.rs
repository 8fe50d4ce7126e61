//! Form payloads, as submitted by `application/x-www-form-urlencoded` bodies.
//!
//! Every field is kept as the raw submitted string so a rejected form can be
//! echoed back unchanged next to its errors.

use serde::{Deserialize, Serialize};

/// Post create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    /// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339.
    pub pub_date: String,
    /// Location id, empty for none.
    pub location: String,
    /// Category id, empty for none.
    pub category: String,
    /// HTML checkbox: present (any of `on`, `true`, `1`) when ticked.
    pub is_published: Option<String>,
}

/// Comment add/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

/// Own-profile edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Account registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

/// Login form. `next` carries the page to return to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: Option<String>,
}

/// `?page=N` on listing routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

impl PageParams {
    /// 1-based page number; anything unparsable means the first page.
    pub fn number(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }
}

/// `?next=/path` on the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_defaults_to_first() {
        assert_eq!(PageParams { page: None }.number(), 1);
        assert_eq!(PageParams { page: Some("abc".into()) }.number(), 1);
        assert_eq!(PageParams { page: Some("0".into()) }.number(), 1);
        assert_eq!(PageParams { page: Some("3".into()) }.number(), 3);
    }

    #[test]
    fn test_passwords_never_echoed() {
        let form = RegistrationForm {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password1: "secret-1".into(),
            password2: "secret-1".into(),
        };

        let json = serde_json::to_string(&form).unwrap();

        assert!(!json.contains("secret-1"));
        assert!(json.contains("ada@example.com"));
    }
}
