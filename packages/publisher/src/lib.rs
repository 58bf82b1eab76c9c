// Content Publisher - API Core
//
// Queue of post titles that are generated into drafts by an LLM and
// promoted to published on a schedule.
//
// Domain logic lives in domains/*/actions; infrastructure in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
