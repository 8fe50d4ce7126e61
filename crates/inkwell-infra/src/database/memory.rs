//! In-memory blog store - used when no database is configured, and in tests.
//!
//! Enforces the same unique keys, foreign keys and delete rules as the
//! PostgreSQL schema. Each repository call runs under a single lock section,
//! so a cascade is as atomic as the database's.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::domain::{
    AuthorSummary, Category, Comment, CommentCard, Location, Page, PageRequest, Post, PostCard,
    PostQuery, User,
};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use inkwell_core::services::Repositories;

#[derive(Default)]
pub(crate) struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn remove_post(&mut self, id: Uuid) {
        self.posts.remove(&id);
        self.comments.retain(|_, c| c.post_id != id);
    }

    fn card(&self, post: &Post) -> Option<PostCard> {
        let author = self.users.get(&post.author_id)?;
        Some(PostCard {
            post: post.clone(),
            author: AuthorSummary::from(author),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as u64,
        })
    }
}

/// A row type stored in one of the tables.
pub(crate) trait Record: Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
    fn table(tables: &Tables) -> &HashMap<Uuid, Self>;
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Unique and foreign key checks before a write.
    fn check(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Remove the row and apply the delete rules of referencing tables.
    fn delete(tables: &mut Tables, id: Uuid) {
        Self::table_mut(tables).remove(&id);
    }
}

fn constraint(msg: String) -> RepoError {
    RepoError::Constraint(msg)
}

impl Record for User {
    const TABLE: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables
            .users
            .values()
            .any(|u| u.id != self.id && u.username == self.username)
        {
            return Err(constraint(format!(
                "duplicate key users.username = {}",
                self.username
            )));
        }
        Ok(())
    }

    fn delete(tables: &mut Tables, id: Uuid) {
        tables.users.remove(&id);
        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
    }
}

impl Record for Category {
    const TABLE: &'static str = "categories";

    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables
            .categories
            .values()
            .any(|c| c.id != self.id && c.slug == self.slug)
        {
            return Err(constraint(format!(
                "duplicate key categories.slug = {}",
                self.slug
            )));
        }
        Ok(())
    }

    fn delete(tables: &mut Tables, id: Uuid) {
        tables.categories.remove(&id);
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
    }
}

impl Record for Location {
    const TABLE: &'static str = "locations";

    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.locations
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.locations
    }

    fn delete(tables: &mut Tables, id: Uuid) {
        tables.locations.remove(&id);
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
    }
}

impl Record for Post {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(constraint("posts.author_id references no user".to_string()));
        }
        if self
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(constraint(
                "posts.category_id references no category".to_string(),
            ));
        }
        if self
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(constraint(
                "posts.location_id references no location".to_string(),
            ));
        }
        Ok(())
    }

    fn delete(tables: &mut Tables, id: Uuid) {
        tables.remove_post(id);
    }
}

impl Record for Comment {
    const TABLE: &'static str = "comments";

    fn id(&self) -> Uuid {
        self.id
    }
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(constraint(
                "comments.author_id references no user".to_string(),
            ));
        }
        if !tables.posts.contains_key(&self.post_id) {
            return Err(constraint(
                "comments.post_id references no post".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory store implementing every blog repository.
///
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the store as the full set of repository ports.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            categories: self.clone(),
            locations: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
        }
    }
}

#[async_trait]
impl<T: Record> BaseRepository<T, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.tables.read().await;
        Ok(T::table(&tables).get(&id).cloned())
    }

    async fn insert(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;

        if T::table(&tables).contains_key(&entity.id()) {
            return Err(constraint(format!(
                "duplicate key {}.id = {}",
                T::TABLE,
                entity.id()
            )));
        }
        entity.check(&tables)?;

        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        tracing::debug!(table = T::TABLE, id = %entity.id(), "Inserted row");
        Ok(entity)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;

        if !T::table(&tables).contains_key(&entity.id()) {
            return Err(RepoError::NotFound);
        }
        entity.check(&tables)?;

        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if !T::table(&tables).contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        T::delete(&mut tables, id);
        tracing::debug!(table = T::TABLE, id = %id, "Deleted row");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables
            .locations
            .values()
            .filter(|l| l.is_published)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn list(&self, query: PostQuery, page: PageRequest) -> Result<Page<PostCard>, RepoError> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| {
                let category = p.category_id.and_then(|id| tables.categories.get(&id));
                query.matches(p, category)
            })
            .collect();
        matching.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let cards: Vec<PostCard> = matching
            .into_iter()
            .filter_map(|p| tables.card(p))
            .collect();
        Ok(Page::from_vec(cards, page))
    }

    async fn find_card(&self, id: Uuid) -> Result<Option<PostCard>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|p| tables.card(p)))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentCard>, RepoError> {
        let tables = self.tables.read().await;

        let mut comments: Vec<CommentCard> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.get(&c.author_id)?;
                Some(CommentCard {
                    comment: c.clone(),
                    author: AuthorSummary::from(author),
                })
            })
            .collect();
        comments.sort_by(|a, b| a.comment.created_at.cmp(&b.comment.created_at));
        Ok(comments)
    }
}
