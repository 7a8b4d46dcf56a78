pub mod error;
pub mod export;
pub mod import;
pub mod ports;
pub mod repos;
pub mod security;
pub mod service;
