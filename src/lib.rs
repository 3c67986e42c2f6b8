// Library interface for confserve
// This allows testing and external usage of confserve components

pub mod args;
pub mod config;
pub mod errors;
pub mod file_op;
pub mod file_utils;
pub mod renderer;
pub mod security;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::ConfServeConfig;
pub use errors::{RuntimeError, StartupError};
pub use security::{RateLimitConfig, SecurityConfig, SecurityMiddleware};
pub use store::ConfigStore;
