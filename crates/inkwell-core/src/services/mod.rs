//! Application services composing the ports into use cases.

mod blog;

pub use blog::{
    BlogService, DEFAULT_PER_PAGE, PostChoices, PostDetail, ProfileListing, Repositories,
};
