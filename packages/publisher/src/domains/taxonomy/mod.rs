pub mod actions;
pub mod models;
pub mod resolver;
pub mod store;

pub use models::{TaxonomyKind, Term};
pub use resolver::resolve_terms;
pub use store::PgTaxonomyStore;
