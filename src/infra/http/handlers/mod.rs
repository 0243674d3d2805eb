//! HTTP handlers for the public API.

mod health;
mod posts;

pub use health::*;
pub use posts::*;
