// ABOUTME: Declarative authorization requirements and their evaluator
// ABOUTME: Role groups OR together; policy groups AND, with All or Any combinators
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Authorization
//!
//! Operations declare requirements as plain values: role groups and
//! permission policy groups. The role requirement passes when the
//! principal holds any role from any group. Policy groups must each pass
//! and carry a combinator: `All` checks every policy before deciding,
//! `Any` stops at the first policy held.

use crate::errors::AppError;
use crate::identity::IdentityService;
use uuid::Uuid;

/// How the policies inside one permission group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Every policy must be held; evaluation never short-circuits so a
    /// detailed deny can name every missing policy
    All,
    /// Any one policy suffices; evaluation stops at the first held
    Any,
}

/// One group of permission policies
#[derive(Debug, Clone)]
pub struct PermissionGroup {
    pub policies: Vec<String>,
    pub combinator: Combinator,
}

/// Requirements an operation declares before it runs
#[derive(Debug, Clone, Default)]
pub struct OperationRequirements {
    /// Groups of role names; holding any role from any group suffices
    pub role_groups: Vec<Vec<String>>,
    /// Permission policy groups; groups AND together
    pub permission_groups: Vec<PermissionGroup>,
}

impl OperationRequirements {
    /// No requirements: anonymous callers pass
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a role group
    #[must_use]
    pub fn role_group<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_groups
            .push(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Add a permission policy group
    #[must_use]
    pub fn permission_group<I, S>(mut self, policies: I, combinator: Combinator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permission_groups.push(PermissionGroup {
            policies: policies.into_iter().map(Into::into).collect(),
            combinator,
        });
        self
    }

    /// Single-policy shorthand
    #[must_use]
    pub fn policy(self, policy: &str) -> Self {
        self.permission_group([policy], Combinator::Any)
    }

    /// Whether there is anything to enforce
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.role_groups.is_empty() && self.permission_groups.is_empty()
    }
}

/// Evaluates operation requirements against a principal's grants
#[derive(Clone)]
pub struct AuthorizationEvaluator {
    detailed_errors: bool,
}

impl AuthorizationEvaluator {
    #[must_use]
    pub const fn new(detailed_errors: bool) -> Self {
        Self { detailed_errors }
    }

    /// Check the requirements; `Ok(())` means the operation may run
    ///
    /// # Errors
    ///
    /// Returns an unauthenticated error when requirements exist but no
    /// principal does, and a forbidden error when the principal lacks a
    /// required role or policy.
    pub async fn evaluate(
        &self,
        requirements: &OperationRequirements,
        principal: Option<Uuid>,
        identity: &IdentityService,
    ) -> Result<(), AppError> {
        if requirements.is_empty() {
            return Ok(());
        }

        let Some(user_id) = principal else {
            return Err(AppError::unauthenticated());
        };

        if !requirements.role_groups.is_empty() {
            let mut held = false;
            'role_groups: for group in &requirements.role_groups {
                for role in group {
                    if identity.is_in_role(user_id, role).await? {
                        held = true;
                        break 'role_groups;
                    }
                }
            }
            if !held {
                let wanted = requirements.role_groups.concat();
                return Err(self.deny(&format!("Missing role: one of [{}]", wanted.join(", "))));
            }
        }

        for group in &requirements.permission_groups {
            match group.combinator {
                Combinator::All => {
                    let mut missing = Vec::new();
                    for policy in &group.policies {
                        if !identity.has_permission(user_id, policy).await? {
                            missing.push(policy.clone());
                        }
                    }
                    if !missing.is_empty() {
                        return Err(
                            self.deny(&format!("Missing permissions: [{}]", missing.join(", ")))
                        );
                    }
                }
                Combinator::Any => {
                    let mut held = false;
                    for policy in &group.policies {
                        if identity.has_permission(user_id, policy).await? {
                            held = true;
                            break;
                        }
                    }
                    if !held {
                        return Err(self.deny(&format!(
                            "Missing permission: one of [{}]",
                            group.policies.join(", ")
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn deny(&self, reason: &str) -> AppError {
        if self.detailed_errors {
            AppError::forbidden(reason)
        } else {
            AppError::forbidden("Forbidden")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_requirements() {
        let requirements = OperationRequirements::none();
        assert!(requirements.is_empty());
    }

    #[test]
    fn test_builder_accumulates_groups() {
        let requirements = OperationRequirements::none()
            .role_group(["Admin"])
            .policy("CanList")
            .permission_group(["CanCreate", "CanEdit"], Combinator::All);

        assert_eq!(requirements.role_groups, vec![vec!["Admin".to_owned()]]);
        assert_eq!(requirements.permission_groups.len(), 2);
        assert_eq!(
            requirements.permission_groups[0].combinator,
            Combinator::Any
        );
        assert_eq!(
            requirements.permission_groups[1].combinator,
            Combinator::All
        );
    }
}
