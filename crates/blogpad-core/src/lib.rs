//! # Blogpad Core
//!
//! The domain layer of Blogpad.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, repository ports, pagination, form validation and the blog service
//! that the HTTP layer drives.

pub mod blog;
pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;

pub use blog::{BlogService, BlogSettings};
pub use error::DomainError;
