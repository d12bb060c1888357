pub mod config;
pub mod errors;
pub mod flow;
pub mod handlers;
pub mod provider;
pub mod routes;
pub mod session;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use errors::app_error::{AppError, AppResult};
pub use flow::{FlowCompiler, FlowError};
pub use state::AppState;
