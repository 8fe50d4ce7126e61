//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod page;
mod post;
mod user;

pub use category::{Category, is_valid_slug};
pub use comment::{Comment, CommentCard};
pub use location::Location;
pub use page::{Page, PageRequest};
pub use post::{AuthorSummary, MAX_TITLE_LEN, Post, PostCard, PostDraft, PostQuery, is_visible};
pub use user::{Actor, ProfileDraft, User};
