// Business domains
pub mod auth;
pub mod posts;
pub mod queue;
pub mod taxonomy;
