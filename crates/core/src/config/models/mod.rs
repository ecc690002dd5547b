pub mod app_config;
pub mod cache_optimizer;
pub mod coordinator;
pub mod observability;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use cache_optimizer::{CacheConfig, OptimizerConfig};
pub use coordinator::{CoordinatorConfig, DispatchStrategyKind, RetryConfig};
pub use observability::ObservabilityConfig;
