//! Infrastructure storage layer - database persistence via SeaORM.
//!
//! ## Architecture
//!
//! This module contains ALL SeaORM-specific code and database operations:
//! - `entity/` - SeaORM entity definitions (users, roles)
//! - `mapper.rs` - Conversions between SeaORM models and SDK contract types
//! - `migrations/` - Database schema migrations
//! - `db.rs` - Classification of `DbErr` into storage error kinds
//!
//! ## Layering Rules
//!
//! The infrastructure layer:
//! - **Contains**: ALL SeaORM imports and database-specific code
//! - **Uses**: `user_admin_sdk` contract types as the domain model
//! - **Provides**: implementations of `domain::repos::{UsersRepository, RolesRepository}`
//!
//! Emails are normalized (trimmed, lowercase) on the way in, which keeps the unique
//! index on `users.email` case-insensitive on every backend.

pub mod db;
pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod roles_sea_repo;
pub mod users_sea_repo;

pub use roles_sea_repo::OrmRolesRepository;
pub use users_sea_repo::OrmUsersRepository;
