//! Adapters behind the domain's repository and port traits.

pub mod export;
pub mod password;
pub mod storage;
pub mod tabular;
