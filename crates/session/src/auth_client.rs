//! Status probe and OAuth code exchange.

use std::sync::Arc;

use proto::{AuthError, AuthState, ChannelInfo, LoginResponse, StatusResponse};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::markers::MarkerStore;
use crate::oauth::OAuthExchangeRequest;
use crate::store::SessionStore;

/// Translates backend auth calls into [`SessionStore`] transitions.
/// The only component that mutates the store.
pub struct AuthClient {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    markers: MarkerStore,
}

impl AuthClient {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>, markers: MarkerStore) -> Self {
        Self {
            backend,
            session,
            markers,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Issues one status query and always leaves the store in a terminal state.
    /// Any transport or decode failure resolves to `Unauthenticated`.
    pub async fn probe_status(&self) -> AuthState {
        let hint = self.markers.load();
        if hint.authenticated {
            debug!("Local marker present, expecting a warm session");
        }

        match self.backend.auth_status().await {
            Ok(StatusResponse {
                authenticated: true,
                channel_info,
            }) => {
                // The probe's channel wins; earlier identity only fills a gap.
                let channel = channel_info
                    .or_else(|| self.session.snapshot().channel().cloned())
                    .or(hint.channel_info);
                info!(channel = ?channel.as_ref().map(|c| c.name.as_str()), "Status probe: authenticated");
                self.session.set_authenticated(channel);
            }
            Ok(StatusResponse {
                authenticated: false,
                ..
            }) => {
                if hint.authenticated {
                    warn!("Local marker disagrees with status probe, clearing it");
                    if let Err(e) = self.markers.clear() {
                        warn!(error = %e, "Failed to clear session markers");
                    }
                }
                info!("Status probe: unauthenticated");
                self.fail_closed();
            }
            Err(e) => {
                warn!(error = %e, "Auth check failed, treating session as unauthenticated");
                self.fail_closed();
            }
        }

        self.session.snapshot()
    }

    /// Fetches the provider authorization URL from the backend.
    pub async fn login_url(&self) -> Result<LoginResponse, AuthError> {
        let response = self.backend.auth_login().await?;
        debug!(has_state = %response.state.is_some(), "Authorization URL received");
        Ok(response)
    }

    /// Sends the code to the backend exactly once. On success the store is
    /// authenticated and the durable markers are rewritten; on failure the
    /// store is left untouched.
    pub async fn exchange_code(
        &self,
        request: OAuthExchangeRequest,
    ) -> Result<Option<ChannelInfo>, AuthError> {
        let body = request.into_body();
        debug!(code_len = %body.code.len(), has_state = %body.state.is_some(), "Sending authorization code");

        let response = self.backend.auth_callback(&body).await.map_err(|e| {
            warn!(error = %e, "OAuth callback exchange failed");
            AuthError::from(e)
        })?;

        self.session.set_authenticated(response.channel_info.clone());
        if let Err(e) = self.markers.record_exchange(response.channel_info.clone()) {
            warn!(error = %e, "Failed to persist session markers");
        }
        info!(channel = ?response.channel_info.as_ref().map(|c| c.name.as_str()), "OAuth exchange succeeded");
        Ok(response.channel_info)
    }

    /// Parses a redirect URL and exchanges its code. A URL without a code
    /// fails before any network call.
    pub async fn complete_redirect(&self, redirect_url: &str) -> Result<Option<ChannelInfo>, AuthError> {
        let request = OAuthExchangeRequest::from_redirect_url(redirect_url).inspect_err(|e| {
            warn!(error = %e, "Redirect rejected before exchange");
        })?;
        self.exchange_code(request).await
    }

    fn fail_closed(&self) {
        if let Err(e) = self.session.set_unauthenticated() {
            debug!(error = %e, "Keeping authenticated session");
        }
    }
}
