//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod alerts;
pub mod deps;
pub mod rate_limit;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAIGenerator;
pub use alerts::{create_alert_notifier, LogNotifier, ResendNotifier};
pub use deps::ServerDeps;
pub use rate_limit::InMemoryRateLimitStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
