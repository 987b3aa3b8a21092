//! Client for Whisper, a one-time secret sharing service.
//!
//! The browser pages of the service map to explicit state machines here:
//! [`CreationFlow`] for the create page and its share modal, [`RetrievalFlow`]
//! for `/secret/{token}` with its password prompt and destroy button, and
//! [`StatusBadge`] for the footer. All of them talk to the API through
//! [`SecretService`], implemented over HTTP by [`Client`].

pub mod api;
pub mod client;
pub mod config;
pub mod create;
pub mod encoding;
pub mod error;
pub mod form;
pub mod retrieve;
pub mod route;
pub mod session;
pub mod status;

#[cfg(test)]
mod test_utils;

pub use api::{
    AccessLimit, Lifetime, SecretPayload, SecretRecord, SecretRequest, SecretToken, ServerStatus,
    ServiceState,
};
pub use client::{Client, SecretService};
pub use config::Config;
pub use create::{CreationFlow, CreationState, ShareLink};
pub use encoding::Credential;
pub use error::{Result, ValidationErrors, WhisperError};
pub use form::{SecretFile, SecretForm, SecretTab};
pub use retrieve::{DestroyOutcome, RetrievalFlow, RetrievalState, RetrievalStatus};
pub use route::{Route, token_from_link};
pub use session::{FileSession, MemorySession, PasswordCache, SessionStore};
pub use status::{BadgeColor, StatusBadge, fetch_badge};
