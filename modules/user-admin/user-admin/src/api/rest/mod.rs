//! REST surface: wire DTOs, the error mapping, auth middleware, handlers and routes.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
