//! Route scenarios against the in-memory store.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{TimeDelta, Utc};
use serde_json::Value;

use inkwell_core::domain::{Actor, Category, Post, PostDraft, User};
use inkwell_core::ports::{PasswordService, STAFF_ROLE};
use inkwell_infra::{InMemoryStore, JwtConfig};

use crate::middleware::auth::SESSION_COOKIE;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .configure(super::configure_routes),
        )
        .await
    };
}

struct Fixture {
    state: AppState,
    open: Category,
    closed: Category,
}

impl Fixture {
    async fn new() -> Self {
        let repos = Arc::new(InMemoryStore::new()).repositories();
        let open = repos
            .categories
            .insert(Category::new(
                "Travel".to_string(),
                "Trips".to_string(),
                "travel".to_string(),
            ))
            .await
            .unwrap();
        let mut closed = Category::new("Drafts".to_string(), String::new(), "drafts".to_string());
        closed.is_published = false;
        let closed = repos.categories.insert(closed).await.unwrap();

        Self {
            state: AppState::with_repositories(repos, JwtConfig::default(), 10),
            open,
            closed,
        }
    }

    async fn user(&self, username: &str, password: &str) -> User {
        let hash = self.state.passwords.hash(password).unwrap();
        self.state
            .blog
            .register(username.to_string(), format!("{username}@example.com"), hash)
            .await
            .unwrap()
    }

    async fn staff(&self, username: &str) -> User {
        let mut user = self.user(username, "staff-password").await;
        user.is_staff = true;
        self.state.blog.repositories().users.update(user).await.unwrap()
    }

    fn session(&self, user: &User) -> Cookie<'static> {
        let mut roles = vec!["user".to_string()];
        if user.is_staff {
            roles.push(STAFF_ROLE.to_string());
        }
        let token = self
            .state
            .tokens
            .generate_token(user.id, &user.username, roles)
            .unwrap();
        Cookie::new(SESSION_COOKIE, token)
    }

    async fn post(&self, author: &User, category: &Category, offset: TimeDelta, published: bool) -> Post {
        self.state
            .blog
            .create_post(
                &Actor::from(author),
                PostDraft {
                    title: "Morning walk".to_string(),
                    text: "Along the river".to_string(),
                    pub_date: Utc::now() + offset,
                    is_published: published,
                    location_id: None,
                    category_id: Some(category.id),
                },
            )
            .await
            .unwrap()
    }

    async fn stored_post(&self, id: uuid::Uuid) -> Option<Post> {
        self.state.blog.repositories().posts.find_by_id(id).await.unwrap()
    }
}

fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_health() {
    let fx = Fixture::new().await;
    let app = test_app!(fx.state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_home_lists_only_visible_posts() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let visible = fx.post(&author, &fx.open, -TimeDelta::hours(1), true).await;
    fx.post(&author, &fx.open, -TimeDelta::hours(1), false).await;
    fx.post(&author, &fx.closed, -TimeDelta::hours(1), true).await;
    fx.post(&author, &fx.open, TimeDelta::hours(1), true).await;
    let app = test_app!(fx.state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    let items = body["page_obj"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["post"]["id"], visible.id.to_string());
    assert_eq!(items[0]["author"]["username"], "ada");
    assert_eq!(items[0]["comment_count"], 0);
}

#[actix_web::test]
async fn test_page_parameter() {
    let fx = Fixture::new().await;
    let app = test_app!(fx.state);

    let res = test::call_service(&app, test::TestRequest::get().uri("/?page=abc").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(&app, test::TestRequest::get().uri("/?page=2").to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/?page=18446744073709551615")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unpublished_category_is_not_found() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    fx.post(&author, &fx.closed, -TimeDelta::hours(1), true).await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/drafts/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["instance"], "/category/drafts/");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/not%20a%20slug/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/travel/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_own_profile_shows_hidden_posts() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    fx.post(&author, &fx.open, -TimeDelta::hours(1), true).await;
    fx.post(&author, &fx.open, -TimeDelta::hours(1), false).await;
    let app = test_app!(fx.state);

    let anonymous = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/ada/").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(anonymous).await;
    assert_eq!(body["page_obj"]["total_items"], 1);
    assert_eq!(body["is_owner"], false);

    let own = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/ada/")
            .cookie(fx.session(&author))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(own).await;
    assert_eq!(body["page_obj"]["total_items"], 2);
    assert_eq!(body["is_owner"], true);
    assert!(body["profile"].get("password_hash").is_none());

    let missing = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/nobody/").to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_hidden_post_detail_only_for_author() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let reader = fx.user("bob", "bob-password").await;
    let post = fx.post(&author, &fx.open, TimeDelta::hours(1), true).await;
    let app = test_app!(fx.state);
    let uri = format!("/posts/{}/", post.id);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).cookie(fx.session(&reader)).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).cookie(fx.session(&author)).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["can_edit"], true);
    assert_eq!(body["form"]["text"], "");
}

#[actix_web::test]
async fn test_malformed_ids_are_not_found() {
    let fx = Fixture::new().await;
    let app = test_app!(fx.state);

    for uri in ["/posts/not-a-uuid/", "/no/such/page/"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_anonymous_edit_redirects_to_login() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let post = fx.post(&author, &fx.open, -TimeDelta::hours(1), true).await;
    let app = test_app!(fx.state);
    let uri = format!("/posts/{}/edit/", post.id);

    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        format!("/auth/login/?next=%2Fposts%2F{}%2Fedit%2F", post.id)
    );

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .set_form(&[("title", "Hijacked"), ("text", "x"), ("pub_date", "2024-01-01")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(fx.stored_post(post.id).await.unwrap(), post);
}

#[actix_web::test]
async fn test_create_post_validation_persists_nothing() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(fx.session(&author))
            .set_form(&[("title", ""), ("text", ""), ("pub_date", "2024-01-01")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["text"].is_array());
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);

    let profile = fx
        .state
        .blog
        .profile("ada", Some(&Actor::from(&author)), 1, Utc::now())
        .await
        .unwrap();
    assert_eq!(profile.posts.total_items, 0);
}

#[actix_web::test]
async fn test_create_post_redirects_home() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let app = test_app!(fx.state);
    let category = fx.open.id.to_string();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(fx.session(&author))
            .set_form(&[
                ("title", "Harbour"),
                ("text", "Boats at dawn"),
                ("pub_date", "2020-06-01T06:30"),
                ("category", category.as_str()),
                ("location", ""),
                ("is_published", "on"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let home = fx.state.blog.home(1, Utc::now()).await.unwrap();
    assert_eq!(home.items.len(), 1);
    assert_eq!(home.items[0].post.title, "Harbour");
    assert_eq!(home.items[0].author.id, author.id);
}

#[actix_web::test]
async fn test_unknown_category_is_a_field_error() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let app = test_app!(fx.state);
    let stray = uuid::Uuid::new_v4().to_string();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(fx.session(&author))
            .set_form(&[
                ("title", "Harbour"),
                ("text", "Boats"),
                ("pub_date", "2020-06-01"),
                ("category", stray.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["category"].is_array());
    assert_eq!(body["form"]["title"], "Harbour");
}

#[actix_web::test]
async fn test_only_author_edits_and_deletes_post() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let staff = fx.staff("mod").await;
    let post = fx.post(&author, &fx.open, -TimeDelta::hours(1), true).await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/delete/", post.id))
            .cookie(fx.session(&staff))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(fx.stored_post(post.id).await.is_some());

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/edit/", post.id))
            .cookie(fx.session(&author))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["form"]["title"], "Morning walk");
    assert_eq!(body["post_id"], post.id.to_string());

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .cookie(fx.session(&author))
            .set_form(&[
                ("title", "Evening walk"),
                ("text", "Along the river"),
                ("pub_date", "2020-06-01T18:00"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(fx.stored_post(post.id).await.unwrap().title, "Evening walk");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/delete/", post.id))
            .cookie(fx.session(&author))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(fx.stored_post(post.id).await.is_none());
}

#[actix_web::test]
async fn test_comment_lifecycle_and_moderation() {
    let fx = Fixture::new().await;
    let author = fx.user("ada", "analytical").await;
    let reader = fx.user("bob", "bob-password").await;
    let staff = fx.staff("mod").await;
    let post = fx.post(&author, &fx.open, -TimeDelta::hours(1), true).await;
    let app = test_app!(fx.state);
    let detail = format!("/posts/{}/", post.id);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", post.id))
            .cookie(fx.session(&reader))
            .set_form(&[("text", "Lovely")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), detail);

    let res = test::call_service(&app, test::TestRequest::get().uri(&detail).to_request()).await;
    let body: Value = test::read_body_json(res).await;
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["author"]["username"], "bob");
    assert_eq!(body["form"]["text"], "");
    let comment_id = comments[0]["comment"]["id"].as_str().unwrap().to_string();
    let comment_uri = format!("/posts/{}/comments/{}/", post.id, comment_id);

    // The post's author does not moderate comments on it.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .cookie(fx.session(&author))
            .set_form(&[("text", "Edited by ada")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .cookie(fx.session(&reader))
            .set_form(&[("text", "   ")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .cookie(fx.session(&reader))
            .set_form(&[("text", "Lovely indeed")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let comments = fx.state.blog.post_detail(post.id, None, Utc::now()).await.unwrap().comments;
    assert_eq!(comments[0].comment.text, "Lovely indeed");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("{comment_uri}delete_comment/"))
            .cookie(fx.session(&staff))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), detail);

    let comments = fx.state.blog.post_detail(post.id, None, Utc::now()).await.unwrap().comments;
    assert!(comments.is_empty());
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_not_found() {
    let fx = Fixture::new().await;
    let reader = fx.user("bob", "bob-password").await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", uuid::Uuid::new_v4()))
            .cookie(fx.session(&reader))
            .set_form(&[("text", "Hello?")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", uuid::Uuid::new_v4()))
            .cookie(fx.session(&reader))
            .set_form(&[("text", "   ")])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_edit_profile_redirects_to_new_username() {
    let fx = Fixture::new().await;
    let user = fx.user("ada", "analytical").await;
    fx.user("bob", "bob-password").await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/edit_profile/")
            .cookie(fx.session(&user))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["form"]["username"], "ada");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/edit_profile/")
            .cookie(fx.session(&user))
            .set_form(&[
                ("username", "bob"),
                ("email", "ada@example.com"),
                ("first_name", "Ada"),
                ("last_name", "Lovelace"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/edit_profile/")
            .cookie(fx.session(&user))
            .set_form(&[
                ("username", "countess"),
                ("email", "ada@example.com"),
                ("first_name", "Ada"),
                ("last_name", "Lovelace"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/profile/countess/");
}

#[actix_web::test]
async fn test_login_sets_session_and_follows_next() {
    let fx = Fixture::new().await;
    fx.user("ada", "analytical").await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&[
                ("username", "ada"),
                ("password", "wrong-password"),
                ("next", "/posts/create/"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["__all__"].is_array());
    assert_eq!(body["form"]["next"], "/posts/create/");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&[
                ("username", "ada"),
                ("password", "analytical"),
                ("next", "/posts/create/"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/posts/create/");

    let session = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .unwrap();
    assert_eq!(session.http_only(), Some(true));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/create/")
            .cookie(session)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_bearer_token_authenticates() {
    let fx = Fixture::new().await;
    let user = fx.user("ada", "analytical").await;
    let token = fx.session(&user).value().to_string();
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/edit_profile/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_registration_and_logout() {
    let fx = Fixture::new().await;
    fx.user("ada", "analytical").await;
    let app = test_app!(fx.state);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/registration/")
            .set_form(&[
                ("username", "ada"),
                ("email", "other@example.com"),
                ("password1", "long-enough"),
                ("password2", "long-enough"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["username"].is_array());
    assert!(body["form"].get("password1").is_none());

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/registration/")
            .set_form(&[
                ("username", "grace"),
                ("email", "grace@example.com"),
                ("password1", "long-enough"),
                ("password2", "long-enough"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(res.response().cookies().any(|c| c.name() == SESSION_COOKIE));

    let res = test::call_service(
        &app,
        test::TestRequest::post().uri("/auth/logout/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let cleared = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cleared.value(), "");
}
