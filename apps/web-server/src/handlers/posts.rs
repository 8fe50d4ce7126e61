//! Post listings and the post lifecycle.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use inkwell_core::{DomainError, FieldErrors};
use inkwell_shared::dto::{CommentForm, PageParams, PostForm};

use super::see_other;
use crate::forms;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{self, CategoryPage, FormPage, PostDetailPage, PostFormPage, PostListPage};

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page_obj = state.blog.home(query.number(), Utc::now()).await?;
    Ok(views::render(&PostListPage { page_obj }))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let (category, page_obj) = state
        .blog
        .category_posts(&path, query.number(), Utc::now())
        .await?;
    Ok(views::render(&CategoryPage { category, page_obj }))
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let detail = state
        .blog
        .post_detail(path.into_inner(), actor.as_ref(), Utc::now())
        .await?;

    let can_edit = actor.is_some_and(|a| a.user_id == detail.post.post.author_id);
    Ok(views::render(&PostDetailPage {
        post: detail.post,
        form: CommentForm::default(),
        comments: detail.comments,
        can_edit,
    }))
}

/// 422 re-render of the post form.
async fn invalid_post_form(
    state: &AppState,
    post_id: Option<Uuid>,
    form: PostForm,
    errors: FieldErrors,
) -> AppResult<HttpResponse> {
    let choices = state.blog.post_choices().await?;
    Ok(views::rerender(&PostFormPage::new(
        FormPage::with_errors(form, errors),
        post_id,
        choices,
    )))
}

/// GET /posts/create/
pub async fn create_form(state: web::Data<AppState>, _identity: Identity) -> AppResult<HttpResponse> {
    let choices = state.blog.post_choices().await?;
    let form = PostForm {
        is_published: Some("on".to_string()),
        ..PostForm::default()
    };
    Ok(views::render(&PostFormPage::new(FormPage::new(form), None, choices)))
}

/// POST /posts/create/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let draft = match forms::validate_post(&form) {
        Ok(draft) => draft,
        Err(errors) => return invalid_post_form(&state, None, form, errors).await,
    };

    match state.blog.create_post(&identity.actor(), draft).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, author = %identity.username, "Post created");
            Ok(see_other("/"))
        }
        Err(DomainError::Validation(errors)) => {
            invalid_post_form(&state, None, form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .post_for_edit(&identity.actor(), path.into_inner())
        .await?;
    let choices = state.blog.post_choices().await?;

    Ok(views::render(&PostFormPage::new(
        FormPage::new(forms::post_form_from(&post)),
        Some(post.id),
        choices,
    )))
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let actor = identity.actor();
    let form = form.into_inner();

    let draft = match forms::validate_post(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            // Only the author gets to see the form again.
            state.blog.post_for_edit(&actor, id).await?;
            return invalid_post_form(&state, Some(id), form, errors).await;
        }
    };

    match state.blog.edit_post(&actor, id, draft).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, "Post updated");
            Ok(see_other("/"))
        }
        Err(DomainError::Validation(errors)) => {
            invalid_post_form(&state, Some(id), form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /posts/{id}/delete/
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .delete_post(&identity.actor(), path.into_inner())
        .await?;

    tracing::info!(post_id = %post.id, "Post deleted");
    Ok(see_other("/"))
}
