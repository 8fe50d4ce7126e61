//! Profile pages.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use inkwell_core::DomainError;
use inkwell_shared::dto::{PageParams, ProfileForm};

use super::see_other;
use crate::forms;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{self, FormPage, ProfilePage};

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let listing = state
        .blog
        .profile(&path, identity.actor().as_ref(), query.number(), Utc::now())
        .await?;

    Ok(views::render(&ProfilePage {
        profile: listing.profile,
        is_owner: listing.is_owner,
        page_obj: listing.posts,
    }))
}

/// GET /edit_profile/
pub async fn edit_profile_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = state.blog.current_user(&identity.actor()).await?;
    Ok(views::render(&FormPage::new(forms::profile_form_from(&user))))
}

/// POST /edit_profile/
pub async fn edit_profile(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<ProfileForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let draft = match forms::validate_profile(&form) {
        Ok(draft) => draft,
        Err(errors) => return Ok(views::rerender(&FormPage::with_errors(form, errors))),
    };

    match state.blog.update_profile(&identity.actor(), draft).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Profile updated");
            Ok(see_other(format!("/profile/{}/", user.username)))
        }
        Err(DomainError::Validation(errors)) => {
            Ok(views::rerender(&FormPage::with_errors(form, errors)))
        }
        Err(e) => Err(e.into()),
    }
}
