//! Acting users and their lifecycle capabilities.

use super::{CompanyId, UserId};
use serde::{Deserialize, Serialize};

/// Role of the user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// Platform operator with access to every company.
    SuperAdmin,
    /// Administrator scoped to one company.
    CompanyAdmin,
    /// Driver who claims and completes tasks.
    Driver,
}

/// Authenticated user on whose behalf a lifecycle operation runs.
///
/// The company scope is `None` only for super administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    role: ActorRole,
    company: Option<CompanyId>,
}

impl Actor {
    /// Creates a driver acting within their company.
    #[must_use]
    pub const fn driver(id: UserId, company: CompanyId) -> Self {
        Self {
            id,
            role: ActorRole::Driver,
            company: Some(company),
        }
    }

    /// Creates a company administrator.
    #[must_use]
    pub const fn company_admin(id: UserId, company: CompanyId) -> Self {
        Self {
            id,
            role: ActorRole::CompanyAdmin,
            company: Some(company),
        }
    }

    /// Creates a platform-wide super administrator.
    #[must_use]
    pub const fn super_admin(id: UserId) -> Self {
        Self {
            id,
            role: ActorRole::SuperAdmin,
            company: None,
        }
    }

    /// Returns the acting user's identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the acting user's role.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }

    /// Returns the company scope, if any.
    #[must_use]
    pub const fn company(&self) -> Option<CompanyId> {
        self.company
    }

    /// Returns `true` when the actor is a driver.
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self.role, ActorRole::Driver)
    }

    /// Returns `true` when the actor belongs to `company`.
    #[must_use]
    pub fn belongs_to(&self, company: CompanyId) -> bool {
        self.company == Some(company)
    }

    /// Returns `true` when the actor may administer tasks of `company`.
    #[must_use]
    pub fn administers(&self, company: CompanyId) -> bool {
        match self.role {
            ActorRole::SuperAdmin => true,
            ActorRole::CompanyAdmin => self.belongs_to(company),
            ActorRole::Driver => false,
        }
    }
}
