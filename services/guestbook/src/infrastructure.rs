// Infrastructure layer modules
pub mod config;
pub mod guest_repository;
pub mod logging;

// Re-exports
pub use config::{ConfigError, EnvRepositoryProvider, GuestbookConfig, RepositoryProvider};
pub use guest_repository::{
    DynamoGuestRepository, GuestRepository, QueryOutcome, RepositoryError, CONNECT_TIMEOUT,
};
pub use logging::init_logging;
