// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! # Authentication & Authorization
//!
//! The request-side half of the session-identity layer.
//!
//! ## Pipeline
//!
//! 1. Client sends `Authorization: Bearer <provider token>`
//! 2. [`verifier`] exchanges the token for a verified identity (the provider
//!    does all validation; no keys are held here)
//! 3. [`reconciler`] resolves the identity to its persisted profile row,
//!    creating it on first sight
//! 4. [`gate`] decides whether the profile satisfies the route's capability
//!
//! A failure at any step short-circuits the rest; no protected operation
//! runs on a partially authenticated request.

pub mod error;
pub mod extractor;
pub mod gate;
pub mod reconciler;
pub mod roles;
pub mod verifier;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, AuthContext, OptionalAuth};
pub use gate::{authorize, Capability, Decision, DenyReason};
pub use reconciler::ProfileReconciler;
pub use roles::Role;
pub use verifier::CredentialVerifier;
