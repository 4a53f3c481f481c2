pub mod api_client;
pub mod auth;
pub mod config;
pub mod debounce;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;

pub use error::{Error, Result};
