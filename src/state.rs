// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

use std::sync::Arc;

use crate::auth::{CredentialVerifier, ProfileReconciler};
use crate::provider::{IdentityProvider, ProfileStore, UsageStore};
use crate::recorder::UsageRecorder;

/// Shared application state for the HTTP API.
///
/// Holds the provider seams plus the pipeline stages built over them. Cheap
/// to clone; everything inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub usage: Arc<dyn UsageStore>,
    pub verifier: Arc<CredentialVerifier>,
    pub reconciler: Arc<ProfileReconciler>,
    pub recorder: UsageRecorder,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        usage: Arc<dyn UsageStore>,
    ) -> Self {
        Self {
            verifier: Arc::new(CredentialVerifier::new(identity)),
            reconciler: Arc::new(ProfileReconciler::new(profiles.clone())),
            recorder: UsageRecorder::new(usage.clone()),
            profiles,
            usage,
        }
    }
}
