//! Comment lifecycle.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use inkwell_shared::dto::CommentForm;

use super::{post_url, see_other};
use crate::forms;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{self, CommentFormPage, FormPage};

/// POST /posts/{id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let form = form.into_inner();

    // A missing post is a 404 even when the text is blank.
    let post = state.blog.post(post_id).await?;

    let text = match forms::validate_comment(&form) {
        Ok(text) => text,
        Err(errors) => return Ok(views::rerender(&FormPage::with_errors(form, errors))),
    };

    let comment = state
        .blog
        .add_comment(&identity.actor(), post.id, text)
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment added");
    Ok(see_other(post_url(post_id)))
}

/// GET /posts/{post_id}/comments/{comment_id}/
pub async fn edit_comment_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = state
        .blog
        .comment_for_edit(&identity.actor(), post_id, comment_id)
        .await?;

    Ok(views::render(&CommentFormPage {
        page: FormPage::new(CommentForm { text: comment.text }),
        post_id,
        comment_id,
    }))
}

/// POST /posts/{post_id}/comments/{comment_id}/
pub async fn edit_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let actor = identity.actor();
    let form = form.into_inner();

    let text = match forms::validate_comment(&form) {
        Ok(text) => text,
        Err(errors) => {
            state.blog.comment_for_edit(&actor, post_id, comment_id).await?;
            return Ok(views::rerender(&CommentFormPage {
                page: FormPage::with_errors(form, errors),
                post_id,
                comment_id,
            }));
        }
    };

    state
        .blog
        .edit_comment(&actor, post_id, comment_id, text)
        .await?;

    tracing::info!(comment_id = %comment_id, "Comment updated");
    Ok(see_other(post_url(post_id)))
}

/// POST /posts/{post_id}/comments/{comment_id}/delete_comment/
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    state
        .blog
        .delete_comment(&identity.actor(), post_id, comment_id)
        .await?;

    tracing::info!(comment_id = %comment_id, "Comment deleted");
    Ok(see_other(post_url(post_id)))
}
