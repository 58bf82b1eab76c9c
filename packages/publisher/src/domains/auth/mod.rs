//! Auth domain - verifies editor session tokens
//!
//! Session issuance lives outside this service. Tokens carry the member id,
//! email and admin flag that the admin actions check.

pub mod jwt;

pub use jwt::{Claims, JwtService};
