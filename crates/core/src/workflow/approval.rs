//! Approver authorization for workflow steps.
//!
//! The engine trusts the supplied actor identity; it only checks that the
//! actor's role and approval limit satisfy the step being decided.

use docflow_shared::types::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::Decision;

/// User role in the organization hierarchy.
///
/// Roles are ordered from lowest to highest privilege.
/// Higher roles can perform all actions of lower roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can only view documents.
    Viewer = 0,
    /// Can create and submit documents.
    Submitter = 1,
    /// Can decide steps within their approval limit.
    Approver = 2,
    /// Can decide finance steps and post.
    Accountant = 3,
    /// Full access except ownership transfer.
    Admin = 4,
    /// Full access including ownership transfer.
    Owner = 5,
}

impl UserRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "submitter" => Some(Self::Submitter),
            "approver" => Some(Self::Approver),
            "accountant" => Some(Self::Accountant),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Submitter => "submitter",
            Self::Approver => "approver",
            Self::Accountant => "accountant",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

/// Authenticated caller acting on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Identity supplied by the identity provider.
    pub id: UserId,
    /// Role within the organization.
    pub role: UserRole,
    /// Maximum document amount this actor may approve (approver role only).
    pub approval_limit: Option<Decimal>,
}

impl Actor {
    /// Creates an actor without an approval limit.
    #[must_use]
    pub fn new(id: UserId, role: UserRole) -> Self {
        Self {
            id,
            role,
            approval_limit: None,
        }
    }

    /// Sets the actor's approval limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Decimal) -> Self {
        self.approval_limit = Some(limit);
        self
    }
}

/// Role required by steps whose template does not name one.
pub const DEFAULT_APPROVER_ROLE: UserRole = UserRole::Approver;

/// Stateless engine for approver authorization checks.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Check if an actor can record `decision` on a step.
    ///
    /// # Arguments
    /// * `actor` - The deciding actor
    /// * `required_role` - The step's role requirement (`None` = approver)
    /// * `decision` - The decision being recorded
    /// * `document_amount` - The document amount, if known
    ///
    /// # Returns
    /// * `Ok(())` if the actor can decide
    /// * `Err(WorkflowError::InsufficientRole)` if role is too low
    /// * `Err(WorkflowError::ExceedsApprovalLimit)` if an approval exceeds the limit
    pub fn can_decide(
        actor: &Actor,
        required_role: Option<UserRole>,
        decision: Decision,
        document_amount: Option<Decimal>,
    ) -> Result<(), WorkflowError> {
        let required_role = required_role.unwrap_or(DEFAULT_APPROVER_ROLE);

        if actor.role < required_role {
            return Err(WorkflowError::InsufficientRole {
                user_role: actor.role.as_str().to_string(),
                required_role: required_role.as_str().to_string(),
            });
        }

        // Limits only bind approvals by the approver role; higher roles are unlimited
        if decision == Decision::Approve
            && actor.role == UserRole::Approver
            && let (Some(limit), Some(amount)) = (actor.approval_limit, document_amount)
            && amount > limit
        {
            return Err(WorkflowError::ExceedsApprovalLimit { amount, limit });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn actor(role: UserRole) -> Actor {
        Actor::new(UserId::new(), role)
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::parse("viewer"), Some(UserRole::Viewer));
        assert_eq!(UserRole::parse("SUBMITTER"), Some(UserRole::Submitter));
        assert_eq!(UserRole::parse(" Approver "), Some(UserRole::Approver));
        assert_eq!(UserRole::parse("owner"), Some(UserRole::Owner));
        assert_eq!(UserRole::parse("invalid"), None);
    }

    #[test]
    fn test_user_role_ordering() {
        assert!(UserRole::Viewer < UserRole::Submitter);
        assert!(UserRole::Submitter < UserRole::Approver);
        assert!(UserRole::Approver < UserRole::Accountant);
        assert!(UserRole::Accountant < UserRole::Admin);
        assert!(UserRole::Admin < UserRole::Owner);
    }

    #[test]
    fn test_default_requirement_is_approver() {
        let result =
            ApprovalEngine::can_decide(&actor(UserRole::Submitter), None, Decision::Approve, None);
        assert!(matches!(
            result,
            Err(WorkflowError::InsufficientRole { .. })
        ));
        assert!(
            ApprovalEngine::can_decide(&actor(UserRole::Approver), None, Decision::Approve, None)
                .is_ok()
        );
    }

    #[test]
    fn test_higher_role_satisfies_requirement() {
        let result = ApprovalEngine::can_decide(
            &actor(UserRole::Admin),
            Some(UserRole::Accountant),
            Decision::Reject,
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_approver_limit_enforced_on_approve() {
        let limited = actor(UserRole::Approver).with_limit(dec!(500));
        let result = ApprovalEngine::can_decide(
            &limited,
            Some(UserRole::Approver),
            Decision::Approve,
            Some(dec!(1000)),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::ExceedsApprovalLimit { .. })
        ));
    }

    #[test]
    fn test_approver_limit_ignored_on_reject() {
        let limited = actor(UserRole::Approver).with_limit(dec!(500));
        let result = ApprovalEngine::can_decide(
            &limited,
            Some(UserRole::Approver),
            Decision::Reject,
            Some(dec!(1000)),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_accountant_bypasses_limit() {
        let accountant = actor(UserRole::Accountant).with_limit(dec!(1));
        let result = ApprovalEngine::can_decide(
            &accountant,
            Some(UserRole::Approver),
            Decision::Approve,
            Some(dec!(1_000_000)),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_amount_skips_limit() {
        let limited = actor(UserRole::Approver).with_limit(dec!(1));
        assert!(
            ApprovalEngine::can_decide(&limited, None, Decision::Approve, None).is_ok()
        );
    }
}
