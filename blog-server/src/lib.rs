//! Markdown blog backend: posts live as `<slug>.md` files in a content
//! directory, reads are public, writes require an admin bearer token.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
