pub mod actions;
pub mod models;
pub mod store;

pub use models::{NewDraft, Post, PostFilter};
pub use store::{PgPostStore, PostSlugs};
