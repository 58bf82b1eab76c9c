// Pure utilities - no I/O beyond the injected probes

pub mod slug;

pub use slug::{resolve_unique, slugify, SlugError, SlugProbe, MAX_SLUG_PROBES};
