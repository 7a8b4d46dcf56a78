pub mod role;
pub mod user;

pub use user::{ActiveModel, Column, Entity, Model, Relation};
