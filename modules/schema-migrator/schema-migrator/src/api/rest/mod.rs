//! HTTP surface: `/schema-migrator/v1/*` behind bearer authentication.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
