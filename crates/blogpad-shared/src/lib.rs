//! # Blogpad Shared
//!
//! Wire types shared by the server and its clients: form payloads, query
//! strings and JSON responses.

pub mod dto;
pub mod response;

pub use response::HealthResponse;
