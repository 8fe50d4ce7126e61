//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;
mod profile;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, http::header, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    // Listings
    .route("/", web::get().to(posts::index))
    .route("/category/{slug}/", web::get().to(posts::category_posts))
    .route("/profile/{username}/", web::get().to(profile::profile))
    .service(
        web::resource("/edit_profile/")
            .route(web::get().to(profile::edit_profile_form))
            .route(web::post().to(profile::edit_profile)),
    )
    // Posts; `create/` must win over `{id}/`
    .service(
        web::scope("/posts")
            .service(
                web::resource("/create/")
                    .route(web::get().to(posts::create_form))
                    .route(web::post().to(posts::create_post)),
            )
            .route("/{id}/", web::get().to(posts::post_detail))
            .service(
                web::resource("/{id}/edit/")
                    .route(web::get().to(posts::edit_form))
                    .route(web::post().to(posts::edit_post)),
            )
            .route("/{id}/delete/", web::post().to(posts::delete_post))
            .route("/{id}/comment/", web::post().to(comments::add_comment))
            .service(
                web::resource("/{post_id}/comments/{comment_id}/")
                    .route(web::get().to(comments::edit_comment_form))
                    .route(web::post().to(comments::edit_comment)),
            )
            .route(
                "/{post_id}/comments/{comment_id}/delete_comment/",
                web::post().to(comments::delete_comment),
            ),
    )
    // Auth
    .service(
        web::scope("/auth")
            .service(
                web::resource("/registration/")
                    .route(web::get().to(auth::registration_form))
                    .route(web::post().to(auth::register)),
            )
            .service(
                web::resource("/login/")
                    .route(web::get().to(auth::login_form))
                    .route(web::post().to(auth::login)),
            )
            .route("/logout/", web::post().to(auth::logout)),
    )
    .default_service(web::to(not_found));
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("No page matches the requested URL".to_string()))
}

/// `303 See Other` to `location`.
pub(crate) fn see_other(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn post_url(id: uuid::Uuid) -> String {
    format!("/posts/{}/", id)
}
