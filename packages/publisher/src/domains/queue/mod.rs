pub mod actions;
pub mod models;
pub mod store;

pub use models::{
    Promotion, QueueFilter, QueueItem, QueueItemEdit, QueueStatus, QueueTransition, StatusCounts,
};
pub use store::PgQueueStore;
