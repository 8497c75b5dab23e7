use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error_handling::{MsmError, Result};
use super::http_client::{ApiClient, Backend};

const LOGIN_PATH: &str = "/auth/login/";
const REFRESH_PATH: &str = "/auth/refresh/";

/// Publicly visible part of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub otp_verified: bool,
    pub email: Option<String>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Signed in and past the second factor.
    pub fn is_ready(&self) -> bool {
        self.is_authenticated && self.otp_verified
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    pending_otp: Option<String>,
}

/// Delivers one-time codes to the signed-in user.
#[cfg_attr(test, mockall::automock)]
pub trait OtpSender: Send + Sync {
    fn deliver(&self, email: &str, code: &str) -> Result<()>;
}

/// Writes the code to the log. Only debug builds include the code itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOtpSender;

impl OtpSender for LogOtpSender {
    fn deliver(&self, email: &str, code: &str) -> Result<()> {
        if cfg!(debug_assertions) {
            info!(email = %email, code = %code, "OTP code issued");
        } else {
            info!(email = %email, "OTP code issued");
        }
        Ok(())
    }
}

/// Authentication state shared by the HTTP client and the UI. Clones share
/// the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionInner>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().state.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().state.token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().state.is_authenticated
    }

    pub fn is_otp_verified(&self) -> bool {
        self.inner.read().state.otp_verified
    }

    pub fn has_pending_otp(&self) -> bool {
        self.inner.read().pending_otp.is_some()
    }

    pub fn set_tokens(&self, access: String, refresh: Option<String>) {
        let mut inner = self.inner.write();
        inner.state.token = Some(access);
        if refresh.is_some() {
            inner.state.refresh_token = refresh;
        }
    }

    /// Username/password sign-in. Skips the OTP step. Returns `false` on any
    /// failure, leaving the session untouched.
    pub async fn login_with_credentials(
        &self,
        client: &ApiClient,
        username: &str,
        password: &str,
    ) -> bool {
        let body = json!({ "username": username, "password": password });
        let response = match client.post_json(Backend::Core, LOGIN_PATH, &body).await {
            Ok(response) => response,
            Err(error) => {
                warn!(username = %username, error = %error, "Credential login failed");
                return false;
            }
        };

        let Some(access) = token_at(&response, &["/data/tokens/access"]) else {
            warn!(username = %username, "Login response carried no access token");
            return false;
        };
        let refresh = token_at(&response, &["/data/tokens/refresh"]);

        let mut inner = self.inner.write();
        inner.state = SessionState {
            is_authenticated: true,
            otp_verified: true,
            email: Some(username.to_string()),
            token: Some(access),
            refresh_token: refresh,
            signed_in_at: Some(Utc::now()),
        };
        inner.pending_otp = None;
        info!(username = %username, "Signed in with credentials");
        true
    }

    /// Marks the user signed in by the identity provider and sends the OTP
    /// that completes the sign-in.
    pub fn sign_in_from_sso(&self, email: &str, sender: &dyn OtpSender) -> Result<()> {
        {
            let mut inner = self.inner.write();
            inner.state.is_authenticated = true;
            inner.state.otp_verified = false;
            inner.state.email = Some(email.to_string());
            inner.state.signed_in_at = Some(Utc::now());
        }
        self.resend_otp(sender)
    }

    /// Issues a fresh six-digit code, replacing any pending one.
    pub fn resend_otp(&self, sender: &dyn OtpSender) -> Result<()> {
        let email = self
            .inner
            .read()
            .state
            .email
            .clone()
            .ok_or_else(|| MsmError::Authentication {
                reason: "no signed-in user to send a code to".to_string(),
            })?;

        let code = generate_otp();
        sender.deliver(&email, &code)?;
        self.inner.write().pending_otp = Some(code);
        Ok(())
    }

    pub fn verify_otp(&self, code: &str) -> bool {
        let mut inner = self.inner.write();
        let valid = inner.pending_otp.as_deref() == Some(code.trim());
        if valid {
            inner.state.otp_verified = true;
            inner.pending_otp = None;
        }
        debug!(valid = valid, "OTP verification attempted");
        valid
    }

    /// Exchanges the refresh token for a new access token.
    pub async fn refresh(&self, client: &ApiClient) -> Result<()> {
        let refresh = self
            .inner
            .read()
            .state
            .refresh_token
            .clone()
            .ok_or_else(|| MsmError::Authentication {
                reason: "no refresh token".to_string(),
            })?;

        let response = client
            .post_json(Backend::Core, REFRESH_PATH, &json!({ "refresh": refresh }))
            .await?;
        let access = token_at(&response, &["/data/tokens/access", "/data/access", "/access"])
            .ok_or_else(|| MsmError::Authentication {
                reason: "refresh response carried no access token".to_string(),
            })?;
        let rotated = token_at(&response, &["/data/tokens/refresh", "/data/refresh", "/refresh"]);

        self.set_tokens(access, rotated);
        debug!("Access token refreshed");
        Ok(())
    }

    pub fn logout(&self) {
        *self.inner.write() = SessionInner::default();
        info!("Signed out");
    }
}

fn token_at(response: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|pointer| response.pointer(pointer))
        .find_map(|value| value.as_str())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}
