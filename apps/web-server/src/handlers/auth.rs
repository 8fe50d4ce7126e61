//! Registration, login and logout.

use actix_web::{
    HttpResponse,
    cookie::{Cookie, SameSite, time::Duration},
    web,
};

use inkwell_core::domain::User;
use inkwell_core::ports::{PasswordService, STAFF_ROLE};
use inkwell_core::{DomainError, FieldErrors};
use inkwell_shared::dto::{LoginForm, NextParams, RegistrationForm};

use super::see_other;
use crate::forms;
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{self, FormPage};

/// Redirect targets must stay on this site.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        // Browsers treat `\` like `/`, so `/\host` is protocol-relative too.
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Issue a session token for `user` and wrap it in the session cookie.
fn session_cookie(state: &AppState, user: &User) -> AppResult<Cookie<'static>> {
    let mut roles = vec!["user".to_string()];
    if user.is_staff {
        roles.push(STAFF_ROLE.to_string());
    }

    let token = state
        .tokens
        .generate_token(user.id, &user.username, roles)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .max_age(Duration::seconds(state.tokens.expiration_seconds()))
        .finish())
}

/// GET /auth/registration/
pub async fn registration_form() -> HttpResponse {
    views::render(&FormPage::new(RegistrationForm::default()))
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let registration = match forms::validate_registration(&form) {
        Ok(registration) => registration,
        Err(errors) => return Ok(views::rerender(&FormPage::with_errors(form, errors))),
    };

    let password_hash = state
        .passwords
        .hash(&registration.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = match state
        .blog
        .register(registration.username, registration.email, password_hash)
        .await
    {
        Ok(user) => user,
        Err(DomainError::Validation(errors)) => {
            return Ok(views::rerender(&FormPage::with_errors(form, errors)));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let cookie = session_cookie(&state, &user)?;
    let mut response = see_other("/");
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextParams>) -> HttpResponse {
    views::render(&FormPage::new(LoginForm {
        next: query.into_inner().next,
        ..LoginForm::default()
    }))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let user = state
        .blog
        .repositories()
        .users
        .find_by_username(form.username.trim())
        .await?;

    let verified = match &user {
        Some(user) => state
            .passwords
            .verify(&form.password, &user.password_hash)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        None => {
            state.passwords.verify_decoy(&form.password);
            false
        }
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::info!(username = %form.username, "Failed login attempt");
            let errors = FieldErrors::single(
                FieldErrors::NON_FIELD,
                "Please enter a correct username and password.",
            );
            return Ok(views::rerender(&FormPage::with_errors(form, errors)));
        }
    };

    tracing::info!(user_id = %user.id, "User logged in");

    let cookie = session_cookie(&state, &user)?;
    let mut response = see_other(safe_next(form.next.as_deref()));
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// POST /auth/logout/
pub async fn logout() -> AppResult<HttpResponse> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    let mut response = see_other("/");
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}
