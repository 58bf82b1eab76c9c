use super::{AdminCapability, AuthError};
use crate::common::entity_ids::MemberId;
use tracing::warn;

/// Authenticated caller, populated by the JWT middleware from verified claims.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub member_id: MemberId,
    pub email: String,
    pub is_admin: bool,
}

/// Entry point for authorization checks
///
/// Usage:
/// ```ignore
/// Actor::from_caller(caller)?
///     .can(AdminCapability::ManageQueue)
///     .check(deps)
///     .await?;
/// ```
pub struct Actor {
    actor_id: MemberId,
    email: String,
    is_admin: bool,
}

impl Actor {
    /// Create a new actor for authorization checks
    pub fn new(actor_id: MemberId, email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            actor_id,
            email: email.into(),
            is_admin,
        }
    }

    /// Build an actor from the request identity. No identity is a hard rejection.
    pub fn from_caller(caller: Option<&AuthUser>) -> Result<Self, AuthError> {
        let user = caller.ok_or(AuthError::AuthenticationRequired)?;
        Ok(Self::new(user.member_id, user.email.clone(), user.is_admin))
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: AdminCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor: self,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor: Actor,
    capability: AdminCapability,
}

impl CapabilityBuilder {
    /// Perform the authorization check
    pub async fn check<D>(self, deps: &D) -> Result<(), AuthError>
    where
        D: HasAuthContext + ?Sized,
    {
        check_admin_permission(&self.actor, self.capability, deps)
    }
}

/// Trait for dependencies that can perform auth checks
pub trait HasAuthContext: Send + Sync {
    /// Emails granted admin regardless of the token's admin flag.
    fn admin_emails(&self) -> &[String];
}

/// Core permission check function
///
/// The `is_admin` flag comes from a signed token; the configured admin email
/// list is a second source so an operator can grant access without reissuing
/// tokens.
fn check_admin_permission<D>(
    actor: &Actor,
    capability: AdminCapability,
    deps: &D,
) -> Result<(), AuthError>
where
    D: HasAuthContext + ?Sized,
{
    let listed = deps
        .admin_emails()
        .iter()
        .any(|email| email.eq_ignore_ascii_case(&actor.email));

    if !actor.is_admin && !listed {
        warn!(
            member_id = %actor.actor_id,
            capability = capability.as_str(),
            "Admin capability denied"
        );
        return Err(AuthError::AdminRequired);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestDeps {
        admin_emails: Vec<String>,
    }

    impl HasAuthContext for TestDeps {
        fn admin_emails(&self) -> &[String] {
            &self.admin_emails
        }
    }

    #[tokio::test]
    async fn test_admin_check() {
        let deps = TestDeps {
            admin_emails: vec![],
        };

        let result = Actor::new(MemberId::new(), "editor@example.com", true)
            .can(AdminCapability::ManageQueue)
            .check(&deps)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_listed_email_is_admin() {
        let deps = TestDeps {
            admin_emails: vec!["Owner@Example.com".to_string()],
        };

        let result = Actor::new(MemberId::new(), "owner@example.com", false)
            .can(AdminCapability::TriggerGeneration)
            .check(&deps)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_admin_rejected() {
        let deps = TestDeps {
            admin_emails: vec![],
        };

        let result = Actor::new(MemberId::new(), "reader@example.com", false)
            .can(AdminCapability::ManageQueue)
            .check(&deps)
            .await;

        assert!(matches!(result, Err(AuthError::AdminRequired)));
    }

    #[test]
    fn test_missing_caller_rejected() {
        let result = Actor::from_caller(None);
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));
    }
}
