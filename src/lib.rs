// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! ModuleHub - Session Identity and Authorization Service
//!
//! This crate fronts a Supabase-style identity provider: it verifies bearer
//! credentials, reconciles provider identities into application profiles, and
//! gates HTTP routes on the reconciled role.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential verification, profile reconciliation, route gating
//! - `provider` - Identity, profile, and usage backends (GoTrue/PostgREST)
//! - `session` - Client-side session controller with change subscriptions
//! - `recorder` - Fire-and-forget usage recording

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod recorder;
pub mod session;
pub mod state;
