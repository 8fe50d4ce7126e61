//! Per-route view models, rendered as JSON documents.

use actix_web::{HttpResponse, http::StatusCode};
use serde::Serialize;
use uuid::Uuid;

use inkwell_core::FieldErrors;
use inkwell_core::domain::{Category, CommentCard, Location, Page, PostCard, User};
use inkwell_core::services::PostChoices;
use inkwell_shared::dto::CommentForm;

/// A listing of post cards: home page.
#[derive(Debug, Serialize)]
pub struct PostListPage {
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub profile: User,
    pub is_owner: bool,
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub post: PostCard,
    /// Always empty; posting it still requires a session.
    pub form: CommentForm,
    /// Oldest first.
    pub comments: Vec<CommentCard>,
    pub can_edit: bool,
}

/// Any form page: the submitted (or prefilled) values plus their errors.
#[derive(Debug, Serialize)]
pub struct FormPage<F> {
    pub form: F,
    pub errors: FieldErrors,
}

impl<F> FormPage<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            errors: FieldErrors::new(),
        }
    }

    pub fn with_errors(form: F, errors: FieldErrors) -> Self {
        Self { form, errors }
    }
}

/// The post create/edit form with its choices.
#[derive(Debug, Serialize)]
pub struct PostFormPage<F> {
    #[serde(flatten)]
    pub page: FormPage<F>,
    /// Set when editing an existing post.
    pub post_id: Option<Uuid>,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

impl<F> PostFormPage<F> {
    pub fn new(page: FormPage<F>, post_id: Option<Uuid>, choices: PostChoices) -> Self {
        Self {
            page,
            post_id,
            categories: choices.categories,
            locations: choices.locations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentFormPage<F> {
    #[serde(flatten)]
    pub page: FormPage<F>,
    pub post_id: Uuid,
    pub comment_id: Uuid,
}

/// 200 with the view model.
pub fn render<T: Serialize>(view: &T) -> HttpResponse {
    HttpResponse::Ok().json(view)
}

/// 422 re-render of a form view model.
pub fn rerender<T: Serialize>(view: &T) -> HttpResponse {
    HttpResponse::build(StatusCode::UNPROCESSABLE_ENTITY).json(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_shared::dto::PostForm;

    #[test]
    fn test_post_form_page_flattens_form_and_errors() {
        let page = PostFormPage::new(
            FormPage::with_errors(PostForm::default(), FieldErrors::single("title", "required")),
            None,
            PostChoices::default(),
        );

        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["errors"]["title"][0], "required");
        assert_eq!(json["form"]["title"], "");
        assert!(json["post_id"].is_null());
        assert!(json["categories"].as_array().unwrap().is_empty());
    }
}
