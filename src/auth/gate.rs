// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! The authorization gate.
//!
//! A synchronous, side-effect-free decision function evaluated after the
//! credential has been verified and the profile reconciled. Keeping the
//! decision in one place makes the authorization contract unit-testable in
//! isolation from storage and network.

use crate::models::Profile;

use super::roles::Role;

/// What a protected operation requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Caller must hold a reconciled profile with `role = admin`.
    AdminOnly,
    /// Caller must hold a reconciled profile (any role).
    AuthenticatedOnly,
    /// No requirement; the handler adapts to a possibly-absent profile.
    Optional,
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No reconciled profile is present.
    Unauthenticated,
    /// A profile is present but its role does not satisfy the capability.
    InsufficientPrivilege,
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `profile` satisfies `capability`.
///
/// Pure function: no I/O, no side effects. A `None` profile always denies
/// `AdminOnly` and `AuthenticatedOnly` (fail-closed).
pub fn authorize(profile: Option<&Profile>, capability: Capability) -> Decision {
    match capability {
        Capability::Optional => Decision::Allow,
        Capability::AuthenticatedOnly => match profile {
            Some(_) => Decision::Allow,
            None => Decision::Deny(DenyReason::Unauthenticated),
        },
        Capability::AdminOnly => match profile {
            Some(p) if p.role == Role::Admin => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::InsufficientPrivilege),
            None => Decision::Deny(DenyReason::Unauthenticated),
        },
    }
}
