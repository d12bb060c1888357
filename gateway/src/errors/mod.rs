//! HTTP-facing error type shared by all handlers

pub mod app_error;

pub use app_error::{AppError, AppResult};
