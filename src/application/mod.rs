pub mod conditional;
pub mod error;
pub mod pagination;
pub mod posts;
pub mod repos;
