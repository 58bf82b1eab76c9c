/// Authorization for admin entry points.
///
/// Identity is established upstream (JWT middleware) and arrives as an
/// optional [`AuthUser`]. Actions check it before touching any store:
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, AdminCapability};
///
/// Actor::from_caller(caller)?
///     .can(AdminCapability::ManageQueue)
///     .check(deps)
///     .await?;
/// ```

mod builder;
mod capability;
mod errors;

pub use builder::{Actor, AuthUser, CapabilityBuilder, HasAuthContext};
pub use capability::AdminCapability;
pub use errors::AuthError;
