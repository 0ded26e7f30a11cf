pub mod activity;
pub mod auth;
pub mod board;
pub mod error;
pub mod list;
pub mod reorder;
pub mod seed;
pub mod store;
pub mod task;
pub mod types;
pub mod user;

pub use error::{CoreError, Result};
