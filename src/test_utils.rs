//! Shared test utilities.
//!
//! Tests that read or set `WHISPER_*`, `HOME` or `XDG_CACHE_HOME` must hold
//! `env_lock()` for their whole body.

use std::sync::{Mutex, OnceLock};

use crate::api::{SecretRecord, SecretRequest, SecretToken, ServerStatus};
use crate::client::SecretService;
use crate::encoding::Credential;
use crate::error::{Result, WhisperError};

pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for temporarily setting an environment variable.
pub struct EnvGuard {
    key: String,
    old: Option<String>,
}

impl EnvGuard {
    pub fn set(key: &str, value: &str) -> Self {
        let old = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        Self {
            key: key.to_string(),
            old,
        }
    }

    pub fn remove(key: &str) -> Self {
        let old = std::env::var(key).ok();
        unsafe {
            std::env::remove_var(key);
        }
        Self {
            key: key.to_string(),
            old,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(val) = &self.old {
            unsafe {
                std::env::set_var(&self.key, val);
            }
        } else {
            unsafe {
                std::env::remove_var(&self.key);
            }
        }
    }
}

/// One recorded call against [`FakeService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(SecretRequest),
    Get {
        token: String,
        authorization: Option<String>,
    },
    Delete {
        token: String,
        authorization: Option<String>,
    },
    Status,
}

/// Scripted in-memory service. Each call pops the next reply for its kind.
#[derive(Default)]
pub struct FakeService {
    calls: Mutex<Vec<Call>>,
    create: Mutex<Vec<Result<SecretToken>>>,
    get: Mutex<Vec<Result<SecretRecord>>>,
    delete: Mutex<Vec<Result<()>>>,
    status: Mutex<Vec<Result<ServerStatus>>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, reply: Result<SecretToken>) -> Self {
        self.create.lock().unwrap().push(reply);
        self
    }

    pub fn on_get(self, reply: Result<SecretRecord>) -> Self {
        self.get.lock().unwrap().push(reply);
        self
    }

    pub fn on_delete(self, reply: Result<()>) -> Self {
        self.delete.lock().unwrap().push(reply);
        self
    }

    pub fn on_status(self, reply: Result<ServerStatus>) -> Self {
        self.status.lock().unwrap().push(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<Vec<Result<T>>>) -> Result<T> {
    let mut queue = queue.lock().unwrap();
    if queue.is_empty() {
        return Err(WhisperError::Network("no scripted reply".to_string()));
    }
    queue.remove(0)
}

impl SecretService for FakeService {
    fn create_secret(&self, request: &SecretRequest) -> Result<SecretToken> {
        self.record(Call::Create(request.clone()));
        next(&self.create)
    }

    fn get_secret(&self, token: &str, credential: Option<&Credential>) -> Result<SecretRecord> {
        self.record(Call::Get {
            token: token.to_string(),
            authorization: credential.map(Credential::bearer),
        });
        next(&self.get)
    }

    fn delete_secret(&self, token: &str, credential: Option<&Credential>) -> Result<()> {
        self.record(Call::Delete {
            token: token.to_string(),
            authorization: credential.map(Credential::bearer),
        });
        next(&self.delete)
    }

    fn get_status(&self) -> Result<ServerStatus> {
        self.record(Call::Status);
        next(&self.status)
    }
}

pub fn text_record(secret: &str) -> SecretRecord {
    SecretRecord {
        secret: secret.to_string(),
        filename: None,
        is_base64: false,
        created: None,
        accesses: 1,
        destroyed: false,
    }
}
