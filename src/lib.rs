pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod sources;

pub use db::Database;
pub use error::{AppError, AppResult};
