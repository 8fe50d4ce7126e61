//! # Inkwell Core
//!
//! The domain layer of the Inkwell blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the post visibility predicate, authorization guards, repository
//! ports and the [`services::BlogService`] use cases.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldErrors};
