//! Authorization guards for mutating posts and comments.

use crate::domain::{Actor, Comment, Post};
use crate::error::DomainError;

/// Only the author may change a post.
pub fn can_modify_post(actor: &Actor, post: &Post) -> bool {
    actor.user_id == post.author_id
}

/// The author or any staff member may change a comment.
pub fn can_modify_comment(actor: &Actor, comment: &Comment) -> bool {
    actor.is_staff || actor.user_id == comment.author_id
}

pub fn ensure_post_author(actor: &Actor, post: &Post) -> Result<(), DomainError> {
    if can_modify_post(actor, post) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

pub fn ensure_comment_moderator(actor: &Actor, comment: &Comment) -> Result<(), DomainError> {
    if can_modify_comment(actor, comment) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}
