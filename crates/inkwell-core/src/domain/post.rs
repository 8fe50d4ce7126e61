use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Location};

pub const MAX_TITLE_LEN: usize = 256;

/// Post entity - a blog entry, possibly scheduled for later publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl Post {
    /// Create a new post owned by `author_id` from validated form data.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            is_published: draft.is_published,
            created_at: Utc::now(),
            author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
        }
    }

    /// Overwrite the editable fields, keeping identity and authorship.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.is_published = draft.is_published;
        self.location_id = draft.location_id;
        self.category_id = draft.category_id;
    }
}

/// Validated post form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

/// The visibility predicate: published, in a published category, and due.
///
/// A post without a category never satisfies it.
pub fn is_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && category.is_some_and(|c| c.is_published) && post.pub_date <= now
}

/// Author fields shown next to a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&super::User> for AuthorSummary {
    fn from(user: &super::User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// A post with its author, location and category resolved and its comments counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCard {
    pub post: Post,
    pub author: AuthorSummary,
    pub location: Option<Location>,
    pub category: Option<Category>,
    pub comment_count: u64,
}

impl PostCard {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        is_visible(&self.post, self.category.as_ref(), now)
    }
}

/// Filter applied by post listings.
///
/// `visible_at` switches on the visibility predicate evaluated at that instant;
/// `None` lists regardless of publication state (own profile).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub visible_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl PostQuery {
    pub fn visible(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Whether `post` belongs in this listing.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        if let Some(now) = self.visible_at {
            if !is_visible(post, category, now) {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if post.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn post_in(category: Option<&Category>, pub_date: DateTime<Utc>) -> Post {
        Post::new(
            Uuid::new_v4(),
            PostDraft {
                title: "Title".to_string(),
                text: "Text".to_string(),
                pub_date,
                is_published: true,
                location_id: None,
                category_id: category.map(|c| c.id),
            },
        )
    }

    fn category(published: bool) -> Category {
        let mut category = Category::new(
            "Travel".to_string(),
            "Trips".to_string(),
            "travel".to_string(),
        );
        category.is_published = published;
        category
    }

    #[test]
    fn test_visible_when_all_conditions_hold() {
        let now = Utc::now();
        let cat = category(true);
        let post = post_in(Some(&cat), now - TimeDelta::minutes(1));

        assert!(is_visible(&post, Some(&cat), now));
    }

    #[test]
    fn test_pub_date_equal_to_now_is_visible() {
        let now = Utc::now();
        let cat = category(true);
        let post = post_in(Some(&cat), now);

        assert!(is_visible(&post, Some(&cat), now));
    }

    #[test]
    fn test_each_condition_hides_the_post() {
        let now = Utc::now();
        let cat = category(true);

        let mut unpublished = post_in(Some(&cat), now - TimeDelta::hours(1));
        unpublished.is_published = false;
        assert!(!is_visible(&unpublished, Some(&cat), now));

        let hidden_cat = category(false);
        let in_hidden = post_in(Some(&hidden_cat), now - TimeDelta::hours(1));
        assert!(!is_visible(&in_hidden, Some(&hidden_cat), now));

        let scheduled = post_in(Some(&cat), now + TimeDelta::hours(1));
        assert!(!is_visible(&scheduled, Some(&cat), now));

        let uncategorized = post_in(None, now - TimeDelta::hours(1));
        assert!(!is_visible(&uncategorized, None, now));
    }

    #[test]
    fn test_query_filters_compose() {
        let now = Utc::now();
        let cat = category(true);
        let post = post_in(Some(&cat), now - TimeDelta::hours(1));

        assert!(PostQuery::default().matches(&post, Some(&cat)));
        assert!(PostQuery::visible(now).in_category(cat.id).matches(&post, Some(&cat)));
        assert!(!PostQuery::visible(now)
            .in_category(Uuid::new_v4())
            .matches(&post, Some(&cat)));
        assert!(!PostQuery::default()
            .by_author(Uuid::new_v4())
            .matches(&post, Some(&cat)));
    }
}
