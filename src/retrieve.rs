//! Retrieval of a secret by token, including the password prompt and destroy.

use tracing::warn;

use crate::api::SecretRecord;
use crate::client::SecretService;
use crate::encoding::Credential;
use crate::error::WhisperError;
use crate::route::Route;
use crate::session::{PasswordCache, SessionStore};

pub const NOT_FOUND_MESSAGE: &str = "No secret exists with the specified token.";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "A password is required to access this Secret";
pub const PASSWORD_REJECTED_MESSAGE: &str = "Password not accepted, please try again.";
pub const DESTROYED_NOTICE: &str = "This is the last time you will be able to access this Secret, it has been destroyed now that you've retrieved it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStatus {
    Pending,
    Unauthorized,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalState {
    Pending,
    /// Password prompt. `error` is shown above it after a rejected attempt.
    Unauthorized { error: Option<String> },
    Error { message: String },
    Success(SecretRecord),
}

#[derive(Debug)]
pub enum DestroyOutcome {
    /// The user did not confirm; nothing was sent.
    Cancelled,
    /// The secret is already destroyed, there is nothing to delete.
    Unavailable,
    /// Deleted; the UI moves on to `next`.
    Destroyed { next: Route },
    Failed(WhisperError),
}

/// One secret page: fetch, optional password round trip, destroy.
pub struct RetrievalFlow {
    token: String,
    state: RetrievalState,
    credential: Option<Credential>,
}

impl RetrievalFlow {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            state: RetrievalState::Pending,
            credential: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> &RetrievalState {
        &self.state
    }

    pub fn status(&self) -> RetrievalStatus {
        match self.state {
            RetrievalState::Pending => RetrievalStatus::Pending,
            RetrievalState::Unauthorized { .. } => RetrievalStatus::Unauthorized,
            RetrievalState::Error { .. } => RetrievalStatus::Error,
            RetrievalState::Success(_) => RetrievalStatus::Success,
        }
    }

    pub fn record(&self) -> Option<&SecretRecord> {
        match &self.state {
            RetrievalState::Success(record) => Some(record),
            _ => None,
        }
    }

    /// Destroy is offered only for a record the server has not already destroyed.
    pub fn can_destroy(&self) -> bool {
        self.record().is_some_and(|r| !r.destroyed)
    }

    /// First fetch without a password. Only runs from `Pending`.
    pub fn load<S: SecretService>(&mut self, service: &S) -> &RetrievalState {
        if self.state != RetrievalState::Pending {
            return &self.state;
        }
        self.state = match service.get_secret(&self.token, None) {
            Ok(record) => RetrievalState::Success(record),
            Err(WhisperError::Unauthorized) => RetrievalState::Unauthorized { error: None },
            Err(err) => error_state(err),
        };
        &self.state
    }

    /// Retry with a password from the prompt. Only runs from `Unauthorized`.
    pub fn submit_password<S: SecretService, T: SessionStore>(
        &mut self,
        service: &S,
        cache: &mut PasswordCache<T>,
        password: &str,
    ) -> &RetrievalState {
        if !matches!(self.state, RetrievalState::Unauthorized { .. }) {
            return &self.state;
        }
        if password.is_empty() {
            self.state = RetrievalState::Unauthorized {
                error: Some(PASSWORD_REQUIRED_MESSAGE.to_string()),
            };
            return &self.state;
        }

        let credential = Credential::from_password(password);
        self.state = match service.get_secret(&self.token, Some(&credential)) {
            Ok(record) => {
                if let Err(err) = cache.store(&credential) {
                    warn!(error = %err, "could not cache secret password");
                }
                self.credential = Some(credential);
                RetrievalState::Success(record)
            }
            Err(WhisperError::Unauthorized) => RetrievalState::Unauthorized {
                error: Some(PASSWORD_REJECTED_MESSAGE.to_string()),
            },
            Err(err) => error_state(err),
        };
        &self.state
    }

    /// Destroy the displayed secret once `confirm` agrees.
    ///
    /// A failed delete leaves the flow in `Success` so the user can try again.
    pub fn destroy<S, T, F>(
        &mut self,
        service: &S,
        cache: &mut PasswordCache<T>,
        confirm: F,
    ) -> DestroyOutcome
    where
        S: SecretService,
        T: SessionStore,
        F: FnOnce() -> bool,
    {
        if !self.can_destroy() {
            return DestroyOutcome::Unavailable;
        }
        let credential = self.credential.clone();
        let outcome = destroy_secret(service, cache, &self.token, credential, confirm);
        if matches!(outcome, DestroyOutcome::Destroyed { .. }) {
            self.credential = None;
            if let RetrievalState::Success(record) = &mut self.state {
                record.destroyed = true;
            }
        }
        outcome
    }
}

fn error_state(err: WhisperError) -> RetrievalState {
    let message = match err {
        WhisperError::NotFound => NOT_FOUND_MESSAGE.to_string(),
        other => other.to_string(),
    };
    RetrievalState::Error { message }
}

/// Confirm, then delete `token` with `credential` or the cached one.
/// Clears the cache on success.
pub fn destroy_secret<S, T, F>(
    service: &S,
    cache: &mut PasswordCache<T>,
    token: &str,
    credential: Option<Credential>,
    confirm: F,
) -> DestroyOutcome
where
    S: SecretService,
    T: SessionStore,
    F: FnOnce() -> bool,
{
    if !confirm() {
        return DestroyOutcome::Cancelled;
    }

    let credential = match credential {
        Some(credential) => Some(credential),
        None => cache.load().unwrap_or_else(|err| {
            warn!(error = %err, "could not read cached secret password");
            None
        }),
    };

    match service.delete_secret(token, credential.as_ref()) {
        Ok(()) => {
            if let Err(err) = cache.clear() {
                warn!(error = %err, "could not clear cached secret password");
            }
            DestroyOutcome::Destroyed { next: Route::Create }
        }
        Err(err) => {
            warn!(error = %err, "could not destroy secret");
            DestroyOutcome::Failed(err)
        }
    }
}
