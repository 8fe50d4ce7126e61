//! Blog use cases: listings, post and comment lifecycle, profiles.
//!
//! Every operation takes the acting user and the current instant explicitly;
//! nothing is read from ambient request state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Actor, Category, Comment, CommentCard, Location, Page, PageRequest, Post, PostCard, PostDraft,
    PostQuery, ProfileDraft, User, is_valid_slug,
};
use crate::error::{DomainError, FieldErrors};
use crate::policy;
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

pub const DEFAULT_PER_PAGE: u64 = 10;

/// The repositories the blog operates on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// Options offered by the post form.
#[derive(Debug, Clone, Default)]
pub struct PostChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

/// A profile together with the slice of the user's posts the viewer may see.
#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub profile: User,
    pub is_owner: bool,
    pub posts: Page<PostCard>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostCard,
    pub comments: Vec<CommentCard>,
}

#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
    per_page: u64,
}

impl BlogService {
    pub fn new(repos: Repositories, per_page: u64) -> Self {
        Self {
            repos,
            per_page: per_page.max(1),
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    async fn list_page(&self, query: PostQuery, number: u64) -> Result<Page<PostCard>, DomainError> {
        let page = self
            .repos
            .posts
            .list(query, PageRequest::new(number, self.per_page))
            .await?;

        if page.is_out_of_range() {
            return Err(DomainError::not_found("page", number));
        }
        Ok(page)
    }

    /// Visible posts across the whole blog.
    pub async fn home(&self, page: u64, now: DateTime<Utc>) -> Result<Page<PostCard>, DomainError> {
        self.list_page(PostQuery::visible(now), page).await
    }

    /// Visible posts of a published category.
    pub async fn category_posts(
        &self,
        slug: &str,
        page: u64,
        now: DateTime<Utc>,
    ) -> Result<(Category, Page<PostCard>), DomainError> {
        if !is_valid_slug(slug) {
            return Err(DomainError::not_found("category", slug));
        }

        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let posts = self
            .list_page(PostQuery::visible(now).in_category(category.id), page)
            .await?;
        Ok((category, posts))
    }

    /// A user's posts: everything for the owner, visible posts for anyone else.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<&Actor>,
        page: u64,
        now: DateTime<Utc>,
    ) -> Result<ProfileListing, DomainError> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let is_owner = viewer.is_some_and(|v| v.user_id == profile.id);
        let query = if is_owner {
            PostQuery::default().by_author(profile.id)
        } else {
            PostQuery::visible(now).by_author(profile.id)
        };

        let posts = self.list_page(query, page).await?;
        Ok(ProfileListing {
            profile,
            is_owner,
            posts,
        })
    }

    /// A post with its comments. Hidden posts are only shown to their author.
    pub async fn post_detail(
        &self,
        id: Uuid,
        viewer: Option<&Actor>,
        now: DateTime<Utc>,
    ) -> Result<PostDetail, DomainError> {
        let card = self
            .repos
            .posts
            .find_card(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;

        let is_author = viewer.is_some_and(|v| v.user_id == card.post.author_id);
        if !card.is_visible(now) && !is_author {
            return Err(DomainError::not_found("post", id));
        }

        let comments = self.repos.comments.list_for_post(id).await?;
        Ok(PostDetail {
            post: card,
            comments,
        })
    }

    pub async fn post_choices(&self) -> Result<PostChoices, DomainError> {
        Ok(PostChoices {
            categories: self.repos.categories.list_published().await?,
            locations: self.repos.locations.list_published().await?,
        })
    }

    async fn check_references(&self, draft: &PostDraft) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        if let Some(category_id) = draft.category_id {
            if self.repos.categories.find_by_id(category_id).await?.is_none() {
                errors.add("category", "Select a valid choice.");
            }
        }
        if let Some(location_id) = draft.location_id {
            if self.repos.locations.find_by_id(location_id).await?.is_none() {
                errors.add("location", "Select a valid choice.");
            }
        }

        errors.into_result(()).map_err(DomainError::Validation)
    }

    pub async fn create_post(&self, actor: &Actor, draft: PostDraft) -> Result<Post, DomainError> {
        self.check_references(&draft).await?;
        let post = Post::new(actor.user_id, draft);
        Ok(self.repos.posts.insert(post).await?)
    }

    /// Any stored post, whatever its visibility.
    pub async fn post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    /// The stored post, for prefilling the edit form.
    pub async fn post_for_edit(&self, actor: &Actor, id: Uuid) -> Result<Post, DomainError> {
        let post = self.post(id).await?;
        policy::ensure_post_author(actor, &post)?;
        Ok(post)
    }

    pub async fn edit_post(
        &self,
        actor: &Actor,
        id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let mut post = self.post_for_edit(actor, id).await?;
        self.check_references(&draft).await?;
        post.apply(draft);
        Ok(self.repos.posts.update(post).await?)
    }

    /// Delete a post; its comments go with it.
    pub async fn delete_post(&self, actor: &Actor, id: Uuid) -> Result<Post, DomainError> {
        let post = self.post_for_edit(actor, id).await?;
        self.repos.posts.delete(post.id).await?;
        Ok(post)
    }

    pub async fn current_user(&self, actor: &Actor) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", actor.user_id))
    }

    /// Edit the actor's own profile.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        draft: ProfileDraft,
    ) -> Result<User, DomainError> {
        let mut user = self.current_user(actor).await?;

        if let Some(existing) = self.repos.users.find_by_username(&draft.username).await? {
            if existing.id != user.id {
                return Err(DomainError::Validation(FieldErrors::single(
                    "username",
                    "A user with that username already exists.",
                )));
            }
        }

        user.apply_profile(draft);
        Ok(self.repos.users.update(user).await?)
    }

    /// Create an account. The password must already be hashed.
    pub async fn register(
        &self,
        username: String,
        email: String,
        password_hash: String,
    ) -> Result<User, DomainError> {
        if self.repos.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Validation(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )));
        }

        let user = User::new(username, email, password_hash);
        Ok(self.repos.users.insert(user).await?)
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        let post = self.post(post_id).await?;
        let comment = Comment::new(actor.user_id, post.id, text);
        Ok(self.repos.comments.insert(comment).await?)
    }

    /// The stored comment, for prefilling the edit form.
    pub async fn comment_for_edit(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;

        policy::ensure_comment_moderator(actor, &comment)?;
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        let mut comment = self.comment_for_edit(actor, post_id, comment_id).await?;
        comment.text = text;
        Ok(self.repos.comments.update(comment).await?)
    }

    pub async fn delete_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), DomainError> {
        let comment = self.comment_for_edit(actor, post_id, comment_id).await?;
        self.repos.comments.delete(comment.id).await?;
        Ok(())
    }
}
