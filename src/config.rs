// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names used throughout the
//! application. Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SUPABASE_URL` | Hosted provider base URL | Required |
//! | `SUPABASE_SERVICE_ROLE_KEY` | Service-role key (server only) | Required on the server |
//! | `SUPABASE_ANON_KEY` | Restricted public key (client runtime) | Required on the client |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! ## Trust Boundaries
//!
//! The service-role key grants unrestricted row access and must never be
//! exposed to the client runtime. The anon key is subject to the provider's
//! row-level policies and is the only key a client instance carries.

/// Environment variable name for the provider base URL.
pub const PROVIDER_URL_ENV: &str = "SUPABASE_URL";

/// Environment variable name for the service-role key (server trust boundary).
pub const SERVICE_ROLE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Environment variable name for the restricted public key (client trust boundary).
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
