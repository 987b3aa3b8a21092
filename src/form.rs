//! Create-secret form state and its validation gate.

use std::fs;
use std::path::Path;

use crate::api::{AccessLimit, Lifetime, MAX_ACCESSES, SecretPayload, SecretRequest};
use crate::encoding::{FILE_SIZE, decode_file, format_bytes};
use crate::error::{Result, ValidationErrors, WhisperError};

/// Which input the form is showing; only that input is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretTab {
    #[default]
    Message,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SecretFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone)]
pub struct SecretForm {
    pub tab: SecretTab,
    pub secret: String,
    /// `secret` is already base64, so the server should treat it like file data.
    pub encoded: bool,
    pub file: Option<SecretFile>,
    pub password: String,
    pub unlimited: bool,
    pub accesses: i64,
    /// Empty means the default lifetime.
    pub lifetime: String,
}

impl Default for SecretForm {
    fn default() -> Self {
        Self {
            tab: SecretTab::Message,
            secret: String::new(),
            encoded: false,
            file: None,
            password: String::new(),
            unlimited: true,
            accesses: 1,
            lifetime: Lifetime::default().as_str().to_string(),
        }
    }
}

impl SecretForm {
    pub fn message(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn file(file: SecretFile) -> Self {
        Self {
            tab: SecretTab::File,
            file: Some(file),
            ..Self::default()
        }
    }

    pub fn with_encoded(mut self, encoded: bool) -> Self {
        self.encoded = encoded;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_accesses(mut self, accesses: i64) -> Self {
        self.unlimited = false;
        self.accesses = accesses;
        self
    }

    pub fn with_lifetime(mut self, lifetime: impl Into<String>) -> Self {
        self.lifetime = lifetime.into();
        self
    }

    pub fn access_limit(&self) -> AccessLimit {
        if self.unlimited {
            AccessLimit::Unlimited
        } else {
            AccessLimit::limited(self.accesses)
        }
    }

    /// Check every field and build the request, or report all failures at once.
    pub fn validate(&self) -> Result<SecretRequest> {
        let mut errors = ValidationErrors::default();

        let payload = match self.tab {
            SecretTab::Message => {
                if self.secret.is_empty() {
                    errors.push("secret", "The secret message is required");
                } else if self.encoded && decode_file(&self.secret).is_err() {
                    errors.push("secret", "The secret is not valid base64");
                }
                SecretPayload::Text(self.secret.clone())
            }
            SecretTab::File => match &self.file {
                None => {
                    errors.push("file", "The secret file is required");
                    SecretPayload::Text(String::new())
                }
                Some(file) => {
                    if file.bytes.len() > FILE_SIZE {
                        errors.push(
                            "file",
                            format!(
                                "File is larger than {}",
                                format_bytes(FILE_SIZE as u64)
                            ),
                        );
                    }
                    SecretPayload::File {
                        filename: file.name.clone(),
                        bytes: file.bytes.clone(),
                    }
                }
            },
        };

        if !self.unlimited {
            if self.accesses > MAX_ACCESSES {
                errors.push("accesses", format!("The max number is {MAX_ACCESSES}"));
            } else if self.accesses < 1 {
                errors.push("accesses", "The min number is 1");
            }
        }

        let lifetime = if self.lifetime.trim().is_empty() {
            Some(Lifetime::default())
        } else {
            match self.lifetime.parse::<Lifetime>() {
                Ok(lifetime) => Some(lifetime),
                Err(message) => {
                    errors.push("lifetime", message);
                    None
                }
            }
        };

        match lifetime {
            Some(lifetime) if errors.is_empty() => {
                let mut request = SecretRequest::new(
                    payload,
                    Some(self.password.clone()),
                    self.access_limit(),
                    lifetime,
                );
                if self.tab == SecretTab::Message && self.encoded {
                    request.is_base64 = true;
                }
                Ok(request)
            }
            _ => Err(WhisperError::Validation(errors)),
        }
    }
}
