//! Queue domain actions - entry points for the API routes and scheduler

pub mod admin;
pub mod alert;
pub mod generate;
pub mod publish;
pub mod ticks;

pub use admin::*;
pub use alert::{check_low_queue, AlertOutcome, LowQueueCheck, LOW_QUEUE_THRESHOLD};
pub use generate::{generate_item, GenerateOutcome};
pub use publish::{publish_item, PublishOutcome};
pub use ticks::{generate_tick, publish_tick, TickEntry, TickOutcome, TickReport};
