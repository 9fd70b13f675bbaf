// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! HTTP identity provider (GoTrue-style auth endpoints).
//!
//! Token verification delegates entirely to the provider: `verify_token`
//! sends the user's bearer token to `/auth/v1/user` and the provider decides
//! whether it is valid.
//!
//! Session-change notifications are emitted locally by this client's own
//! sign-in / sign-out / refresh calls, which is how the provider's SDK
//! surfaces `onAuthStateChange` in-process. There is no push channel at this
//! REST surface.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::{IdentityProvider, ProviderClient, ProviderError, SessionEvent};
use crate::models::Identity;

/// Buffered session events per subscriber. Subscribers that lag beyond this
/// lose the oldest events, which is acceptable: only the latest state wins.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A session this client currently holds.
#[derive(Debug, Clone)]
struct LocalSession {
    access_token: String,
    identity: Identity,
}

pub struct HttpIdentityProvider {
    client: ProviderClient,
    session: RwLock<Option<LocalSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpIdentityProvider {
    pub fn new(client: ProviderClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            session: RwLock::new(None),
            events,
        }
    }

    /// Sign in with email and password. On success the session is held
    /// locally and a `SignedIn` notification is emitted.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .client
            .post_json("/auth/v1/token?grant_type=password", &body, None, None)
            .await?;

        let access_token = response
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing access_token in sign-in response".into())
            })?
            .to_string();
        let identity = parse_provider_user(response.get("user").unwrap_or(&Value::Null))?;

        {
            let mut session = self.session.write().await;
            *session = Some(LocalSession {
                access_token,
                identity: identity.clone(),
            });
        }
        let _ = self.events.send(SessionEvent::SignedIn(identity.clone()));

        Ok(identity)
    }

    /// Sign up with email and password; `full_name` lands in the identity's
    /// metadata. When the provider auto-confirms, the returned session is
    /// held locally and a `SignedIn` notification is emitted.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Identity, ProviderError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name }
        });
        let response = self.client.post_json("/auth/v1/signup", &body, None, None).await?;

        // Auto-confirm instances return a session; confirm-by-email instances
        // return only the user.
        let user = response.get("user").filter(|u| !u.is_null()).unwrap_or(&response);
        let identity = parse_provider_user(user)?;

        if let Some(token) = response.get("access_token").and_then(Value::as_str) {
            {
                let mut session = self.session.write().await;
                *session = Some(LocalSession {
                    access_token: token.to_string(),
                    identity: identity.clone(),
                });
            }
            let _ = self.events.send(SessionEvent::SignedIn(identity.clone()));
        }

        Ok(identity)
    }

    /// Request a password-recovery email for `email`.
    ///
    /// Requires no session; the provider sends a recovery link and the flow
    /// completes out of band.
    pub async fn reset_password(&self, email: &str) -> Result<(), ProviderError> {
        let body = json!({ "email": email });
        self.client
            .post_json("/auth/v1/recover", &body, None, None)
            .await?;
        Ok(())
    }

    /// Change the current user's password.
    ///
    /// Requires a held session (either a signed-in one or the one minted by
    /// the recovery link); rejected locally when none is present.
    pub async fn update_password(&self, new_password: &str) -> Result<Identity, ProviderError> {
        let token = self
            .access_token()
            .await
            .ok_or_else(|| ProviderError::Rejected("no active session".into()))?;

        let body = json!({ "password": new_password });
        let response = self
            .client
            .put_json("/auth/v1/user", &body, Some(&token))
            .await?;
        let identity = parse_provider_user(&response)?;

        {
            let mut session = self.session.write().await;
            if let Some(local) = session.as_mut() {
                local.identity = identity.clone();
            }
        }

        Ok(identity)
    }

    /// The access token of the currently held session, if any.
    pub async fn access_token(&self) -> Option<String> {
        let session = self.session.read().await;
        session.as_ref().map(|s| s.access_token.clone())
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Identity, ProviderError> {
        let response = self.client.get_json("/auth/v1/user", Some(token)).await?;
        parse_provider_user(&response)
    }

    async fn fetch_session(&self) -> Result<Option<Identity>, ProviderError> {
        let session = self.session.read().await;
        Ok(session.as_ref().map(|s| s.identity.clone()))
    }

    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        // Local state is cleared and the notification fires no matter what
        // the provider call returns; a stale local session after sign-out is
        // never acceptable.
        let taken = {
            let mut session = self.session.write().await;
            session.take()
        };

        let result = match &taken {
            Some(local) => {
                self.client
                    .post_empty("/auth/v1/logout", Some(&local.access_token))
                    .await
            }
            None => Ok(()),
        };

        if let Err(ref e) = result {
            debug!(error = %e, "provider logout call failed; local session cleared anyway");
        }
        let _ = self.events.send(SessionEvent::SignedOut);

        result
    }
}

/// Parse the provider's user document into an [`Identity`].
///
/// Only string-valued metadata fields are kept; the provider allows arbitrary
/// JSON there but this system reads nothing but strings (`full_name`).
pub(crate) fn parse_provider_user(user: &Value) -> Result<Identity, ProviderError> {
    let id = user
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("missing user id".into()))?
        .to_string();

    let email = user
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let metadata = user
        .get("user_metadata")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(Identity { id, email, metadata })
}
