// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including user management and all usage records
/// - `User` - Normal user, can only access own profile and usage records
///
/// The set is closed on purpose: every authorization decision goes through
/// [`crate::auth::gate::authorize`] rather than string comparisons scattered
/// through handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal user (default for every newly reconciled profile)
    User,
}

impl Role {
    /// Parse role from string (case-insensitive).
    /// Used when validating role values in the role-mutation endpoint.
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is User (least privilege; the reconciler's bootstrap role).
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}
