//! Client-side cache consistency for the forum GraphQL API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
