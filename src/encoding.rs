//! Base64 helpers for passwords and file secrets, byte-size formatting and
//! random secret generation.

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;

use crate::error::{Result, WhisperError};

/// Largest file accepted as a secret (64 KiB).
pub const FILE_SIZE: usize = 64 * 1024;

const SECRET_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_%=+";

const SIZE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Encode a password for the `Authorization: Bearer` header and the session cache.
pub fn encode_password(password: &str) -> String {
    STANDARD.encode(password.as_bytes())
}

/// A base64 encoded password, ready to be sent as a bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn from_password(password: &str) -> Self {
        Credential(encode_password(password))
    }

    /// Wrap a value that is already encoded, e.g. one read back from the session cache.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Credential(encoded.into())
    }

    pub fn encoded(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

pub fn encode_file(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 secret back into file bytes.
pub fn decode_file(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| WhisperError::Decode(format!("secret is not valid base64: {e}")))
}

/// Human readable size with up to two decimals, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Random secret of `len` characters drawn from a URL-friendly alphabet.
pub fn generate_secret(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SECRET_ALPHABET[rng.gen_range(0..SECRET_ALPHABET.len())] as char)
        .collect()
}
