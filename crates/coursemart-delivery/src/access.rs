//! The access gate.
//!
//! An [`AccessGate`] is an ordered chain of [`AccessRule`]s. Each rule either
//! reaches a decision or passes; the first decision wins. A chain in which no
//! rule decides denies with [`DenyReason::NoApplicableRule`].
//!
//! Two chains are used by the API:
//!
//! | Chain                      | Rules                                  |
//! |----------------------------|----------------------------------------|
//! | [`AccessGate::standard`]   | admin, owning seller, paid entitlement |
//! | [`AccessGate::management`] | admin, owning seller, deny `NotOwner`  |
//!
//! The gate never checks existence. Callers resolve the course and block
//! first so that a missing resource is reported as such, whoever asks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use coursemart_core::{DeliveryError, DenyReason, UserRole};
use coursemart_models::{CourseId, UserId};

use crate::ports::{BlockLocation, CourseRef, EntitlementLookup, Identity};

/// What the gate is asked about: a course and its seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTarget {
    pub course_id: CourseId,
    pub owner_id: UserId,
}

impl From<&CourseRef> for AccessTarget {
    fn from(course: &CourseRef) -> Self {
        Self {
            course_id: course.id,
            owner_id: course.owner_id,
        }
    }
}

impl From<&BlockLocation> for AccessTarget {
    fn from(block: &BlockLocation) -> Self {
        Self {
            course_id: block.course_id,
            owner_id: block.owner_id,
        }
    }
}

/// Why access was permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Admin,
    Owner,
    Purchased,
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Purchased => "purchased",
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Permit(Grant),
    Deny(DenyReason),
}

/// One link of the chain.
#[async_trait]
pub trait AccessRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` passes the decision to the next rule.
    async fn evaluate(
        &self,
        identity: &Identity,
        target: &AccessTarget,
        entitlements: &dyn EntitlementLookup,
    ) -> Result<Option<AccessDecision>, DeliveryError>;
}

/// Admins may access everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminRule;

#[async_trait]
impl AccessRule for AdminRule {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        _target: &AccessTarget,
        _entitlements: &dyn EntitlementLookup,
    ) -> Result<Option<AccessDecision>, DeliveryError> {
        Ok((identity.role == UserRole::Admin).then_some(AccessDecision::Permit(Grant::Admin)))
    }
}

/// Sellers may access the courses they sell.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerRule;

#[async_trait]
impl AccessRule for OwnerRule {
    fn name(&self) -> &'static str {
        "owner"
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        target: &AccessTarget,
        _entitlements: &dyn EntitlementLookup,
    ) -> Result<Option<AccessDecision>, DeliveryError> {
        let owns = identity.role == UserRole::Seller && identity.user_id == target.owner_id;
        Ok(owns.then_some(AccessDecision::Permit(Grant::Owner)))
    }
}

/// Anyone holding a paid order for the course. Always decisive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseRule;

#[async_trait]
impl AccessRule for PurchaseRule {
    fn name(&self) -> &'static str {
        "purchase"
    }

    async fn evaluate(
        &self,
        identity: &Identity,
        target: &AccessTarget,
        entitlements: &dyn EntitlementLookup,
    ) -> Result<Option<AccessDecision>, DeliveryError> {
        let paid = entitlements
            .has_paid_entitlement(identity.user_id, target.course_id)
            .await?;

        Ok(Some(if paid {
            AccessDecision::Permit(Grant::Purchased)
        } else {
            AccessDecision::Deny(DenyReason::NotPurchased)
        }))
    }
}

/// Terminal rule that denies with a fixed reason.
#[derive(Debug, Clone, Copy)]
pub struct DenyRule(pub DenyReason);

#[async_trait]
impl AccessRule for DenyRule {
    fn name(&self) -> &'static str {
        "deny"
    }

    async fn evaluate(
        &self,
        _identity: &Identity,
        _target: &AccessTarget,
        _entitlements: &dyn EntitlementLookup,
    ) -> Result<Option<AccessDecision>, DeliveryError> {
        Ok(Some(AccessDecision::Deny(self.0)))
    }
}

#[derive(Clone)]
pub struct AccessGate {
    rules: Vec<Arc<dyn AccessRule>>,
    entitlements: Arc<dyn EntitlementLookup>,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.rules.iter().map(|rule| rule.name()).collect();
        f.debug_struct("AccessGate").field("rules", &names).finish()
    }
}

impl AccessGate {
    /// An empty chain. Denies everything until rules are added.
    pub fn new(entitlements: Arc<dyn EntitlementLookup>) -> Self {
        Self {
            rules: Vec::new(),
            entitlements,
        }
    }

    /// The chain guarding content consumption.
    pub fn standard(entitlements: Arc<dyn EntitlementLookup>) -> Self {
        Self::new(entitlements)
            .with_rule(AdminRule)
            .with_rule(OwnerRule)
            .with_rule(PurchaseRule)
    }

    /// The chain guarding content changes. Buying a course does not let you
    /// edit it.
    pub fn management(entitlements: Arc<dyn EntitlementLookup>) -> Self {
        Self::new(entitlements)
            .with_rule(AdminRule)
            .with_rule(OwnerRule)
            .with_rule(DenyRule(DenyReason::NotOwner))
    }

    /// Append a rule to the end of the chain.
    pub fn with_rule<R>(mut self, rule: R) -> Self
    where
        R: AccessRule + 'static,
    {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    #[tracing::instrument(
        skip_all,
        fields(user_id = %identity.user_id, course_id = %target.course_id)
    )]
    pub async fn decide(
        &self,
        identity: &Identity,
        target: &AccessTarget,
    ) -> Result<AccessDecision, DeliveryError> {
        for rule in &self.rules {
            if let Some(decision) = rule
                .evaluate(identity, target, self.entitlements.as_ref())
                .await?
            {
                tracing::debug!(rule = rule.name(), ?decision, "access decided");
                return Ok(decision);
            }
        }

        tracing::debug!("no access rule reached a decision");
        Ok(AccessDecision::Deny(DenyReason::NoApplicableRule))
    }

    /// Like [`decide`](Self::decide) but turns a denial into
    /// [`DeliveryError::Forbidden`].
    pub async fn authorize(
        &self,
        identity: &Identity,
        target: &AccessTarget,
    ) -> Result<Grant, DeliveryError> {
        match self.decide(identity, target).await? {
            AccessDecision::Permit(grant) => Ok(grant),
            AccessDecision::Deny(reason) => Err(DeliveryError::Forbidden(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEntitlements;
    use coursemart_models::OrderStatus;

    fn identity(role: UserRole) -> Identity {
        Identity {
            user_id: UserId::new(),
            role,
            active: true,
        }
    }

    fn target(owner_id: UserId) -> AccessTarget {
        AccessTarget {
            course_id: CourseId::new(),
            owner_id,
        }
    }

    #[tokio::test]
    async fn test_admin_permitted_without_entitlement() {
        let gate = AccessGate::standard(Arc::new(InMemoryEntitlements::default()));
        let admin = identity(UserRole::Admin);

        let decision = gate.decide(&admin, &target(UserId::new())).await.unwrap();
        assert_eq!(decision, AccessDecision::Permit(Grant::Admin));
    }

    #[tokio::test]
    async fn test_owner_seller_permitted_other_seller_denied() {
        let gate = AccessGate::standard(Arc::new(InMemoryEntitlements::default()));
        let seller = identity(UserRole::Seller);
        let other = identity(UserRole::Seller);
        let course = target(seller.user_id);

        assert_eq!(
            gate.decide(&seller, &course).await.unwrap(),
            AccessDecision::Permit(Grant::Owner)
        );
        assert_eq!(
            gate.decide(&other, &course).await.unwrap(),
            AccessDecision::Deny(DenyReason::NotPurchased)
        );
    }

    #[tokio::test]
    async fn test_buyer_needs_paid_order_for_that_course() {
        let entitlements = Arc::new(InMemoryEntitlements::default());
        let gate = AccessGate::standard(entitlements.clone());
        let buyer = identity(UserRole::Buyer);
        let course = target(UserId::new());
        let other_course = target(course.owner_id);

        entitlements.record(buyer.user_id, course.course_id, OrderStatus::Pending);
        entitlements.record(buyer.user_id, other_course.course_id, OrderStatus::Paid);
        assert!(matches!(
            gate.authorize(&buyer, &course).await,
            Err(DeliveryError::Forbidden(DenyReason::NotPurchased))
        ));

        entitlements.record(buyer.user_id, course.course_id, OrderStatus::Paid);
        assert_eq!(
            gate.authorize(&buyer, &course).await.unwrap(),
            Grant::Purchased
        );
    }

    #[tokio::test]
    async fn test_refunded_order_does_not_grant() {
        let entitlements = Arc::new(InMemoryEntitlements::default());
        let gate = AccessGate::standard(entitlements.clone());
        let buyer = identity(UserRole::Buyer);
        let course = target(UserId::new());

        entitlements.record(buyer.user_id, course.course_id, OrderStatus::Refunded);
        assert_eq!(
            gate.decide(&buyer, &course).await.unwrap(),
            AccessDecision::Deny(DenyReason::NotPurchased)
        );
    }

    #[tokio::test]
    async fn test_management_chain_ignores_purchases() {
        let entitlements = Arc::new(InMemoryEntitlements::default());
        let gate = AccessGate::management(entitlements.clone());
        let buyer = identity(UserRole::Buyer);
        let course = target(UserId::new());
        entitlements.record(buyer.user_id, course.course_id, OrderStatus::Paid);

        assert_eq!(
            gate.decide(&buyer, &course).await.unwrap(),
            AccessDecision::Deny(DenyReason::NotOwner)
        );
        assert_eq!(
            gate.decide(&identity(UserRole::Admin), &course)
                .await
                .unwrap(),
            AccessDecision::Permit(Grant::Admin)
        );
        assert_eq!(gate.rule_names(), vec!["admin", "owner", "deny"]);
    }

    #[tokio::test]
    async fn test_empty_chain_denies() {
        let gate = AccessGate::new(Arc::new(InMemoryEntitlements::default()));
        assert_eq!(
            gate.decide(&identity(UserRole::Admin), &target(UserId::new()))
                .await
                .unwrap(),
            AccessDecision::Deny(DenyReason::NoApplicableRule)
        );
    }

    #[tokio::test]
    async fn test_decisions_are_repeatable() {
        let entitlements = Arc::new(InMemoryEntitlements::default());
        let gate = AccessGate::standard(entitlements.clone());
        let buyer = identity(UserRole::Buyer);
        let course = target(UserId::new());
        entitlements.record(buyer.user_id, course.course_id, OrderStatus::Paid);

        for _ in 0..3 {
            assert_eq!(
                gate.decide(&buyer, &course).await.unwrap(),
                AccessDecision::Permit(Grant::Purchased)
            );
        }
    }
}
