//! Secret creation: validated submit, share link, transient error banner.

use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::warn;

use crate::api::{SecretRequest, SecretToken};
use crate::client::SecretService;
use crate::encoding::Credential;
use crate::error::{Result, WhisperError};
use crate::form::SecretForm;
use crate::retrieve::{DestroyOutcome, destroy_secret};
use crate::route::Route;
use crate::session::{PasswordCache, SessionStore};

/// How long a failed submit keeps its error banner.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// The share modal shown after a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
    pub expires: OffsetDateTime,
}

impl ShareLink {
    pub fn new(token: SecretToken, ui_url: &str) -> Self {
        let url = Route::Secret(token.token.clone()).link(ui_url);
        Self {
            token: token.token,
            url,
            expires: token.expires,
        }
    }

    /// Past expiry the link can no longer be copied or destroyed.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires
    }

    pub fn destroy<S, T, F>(
        &self,
        service: &S,
        cache: &mut PasswordCache<T>,
        confirm: F,
    ) -> DestroyOutcome
    where
        S: SecretService,
        T: SessionStore,
        F: FnOnce() -> bool,
    {
        if self.is_expired(OffsetDateTime::now_utc()) {
            return DestroyOutcome::Unavailable;
        }
        destroy_secret(service, cache, &self.token, None, confirm)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationState {
    Idle,
    Submitting,
    Succeeded(ShareLink),
    Failed { message: String, shown_at: Instant },
}

pub struct CreationFlow {
    ui_url: String,
    state: CreationState,
    password: Option<String>,
}

impl CreationFlow {
    pub fn new(ui_url: impl Into<String>) -> Self {
        Self {
            ui_url: ui_url.into(),
            state: CreationState::Idle,
            password: None,
        }
    }

    pub fn state(&self) -> &CreationState {
        &self.state
    }

    /// Validate the form and move to `Submitting`.
    ///
    /// Invalid forms leave the state untouched. A second submit while one is
    /// outstanding is refused.
    pub fn begin(&mut self, form: &SecretForm) -> Result<SecretRequest> {
        if self.state == CreationState::Submitting {
            return Err(WhisperError::InFlight);
        }
        let request = form.validate()?;
        self.password = request.password.clone();
        self.state = CreationState::Submitting;
        Ok(request)
    }

    /// Apply the server's answer to an outstanding submit.
    pub fn complete<T: SessionStore>(
        &mut self,
        reply: Result<SecretToken>,
        cache: &mut PasswordCache<T>,
        now: Instant,
    ) -> &CreationState {
        if self.state != CreationState::Submitting {
            return &self.state;
        }
        let password = self.password.take();
        self.state = match reply {
            Ok(token) => {
                if let Some(password) = password {
                    if let Err(err) = cache.store(&Credential::from_password(&password)) {
                        warn!(error = %err, "could not cache secret password");
                    }
                }
                CreationState::Succeeded(ShareLink::new(token, &self.ui_url))
            }
            Err(err) => CreationState::Failed {
                message: err.to_string(),
                shown_at: now,
            },
        };
        &self.state
    }

    /// `begin`, call the service, `complete`.
    pub fn submit<S: SecretService, T: SessionStore>(
        &mut self,
        service: &S,
        cache: &mut PasswordCache<T>,
        form: &SecretForm,
    ) -> Result<&CreationState> {
        let request = self.begin(form)?;
        let reply = service.create_secret(&request);
        Ok(self.complete(reply, cache, Instant::now()))
    }

    /// Clear an error banner once it has been shown for [`ERROR_DISPLAY`].
    pub fn tick(&mut self, now: Instant) -> &CreationState {
        if let CreationState::Failed { shown_at, .. } = self.state {
            if now.saturating_duration_since(shown_at) >= ERROR_DISPLAY {
                self.state = CreationState::Idle;
            }
        }
        &self.state
    }

    /// The error banner text, if one is showing.
    pub fn banner(&self) -> Option<&str> {
        match &self.state {
            CreationState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Close the share modal.
    pub fn close(&mut self) {
        if matches!(self.state, CreationState::Succeeded(_)) {
            self.state = CreationState::Idle;
        }
    }
}
