// HTTP middleware
pub mod cron_auth;
pub mod ip_extractor;
pub mod jwt_auth;
pub mod rate_limit;

pub use cron_auth::*;
pub use ip_extractor::*;
pub use jwt_auth::*;
pub use rate_limit::*;
