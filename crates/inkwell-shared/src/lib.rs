//! # Inkwell Shared
//!
//! Wire types shared by the server and any client: submitted form payloads and
//! RFC 7807 problem documents.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
