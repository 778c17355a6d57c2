//! Task API Library
//!
//! A small REST service for managing tasks: list with filter, sort and
//! pagination, create, fetch, partial update and delete, with RS256 bearer
//! tokens guarding the mutating routes.

pub mod api;
pub mod auth;
pub mod domain;
pub mod infrastructure;
