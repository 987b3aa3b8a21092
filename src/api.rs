//! JSON types exchanged with the Whisper API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::encoding;

/// Highest number of accesses a limited secret may allow.
pub const MAX_ACCESSES: i64 = 108;

/// Server-enforced time to live, one of a fixed set of durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifetime {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "3h")]
    ThreeHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "48h")]
    TwoDays,
    #[serde(rename = "72h")]
    ThreeDays,
    #[default]
    #[serde(rename = "168h")]
    SevenDays,
}

impl Lifetime {
    pub const ALL: [Lifetime; 10] = [
        Lifetime::FiveMinutes,
        Lifetime::FifteenMinutes,
        Lifetime::ThirtyMinutes,
        Lifetime::OneHour,
        Lifetime::TwoHours,
        Lifetime::ThreeHours,
        Lifetime::OneDay,
        Lifetime::TwoDays,
        Lifetime::ThreeDays,
        Lifetime::SevenDays,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::FiveMinutes => "5m",
            Lifetime::FifteenMinutes => "15m",
            Lifetime::ThirtyMinutes => "30m",
            Lifetime::OneHour => "1h",
            Lifetime::TwoHours => "2h",
            Lifetime::ThreeHours => "3h",
            Lifetime::OneDay => "24h",
            Lifetime::TwoDays => "48h",
            Lifetime::ThreeDays => "72h",
            Lifetime::SevenDays => "168h",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lifetime::FiveMinutes => "5 min",
            Lifetime::FifteenMinutes => "15 min",
            Lifetime::ThirtyMinutes => "30 min",
            Lifetime::OneHour => "1 hour",
            Lifetime::TwoHours => "2 hours",
            Lifetime::ThreeHours => "3 hours",
            Lifetime::OneDay => "1 day",
            Lifetime::TwoDays => "2 days",
            Lifetime::ThreeDays => "3 days",
            Lifetime::SevenDays => "7 days",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Lifetime::ALL
            .into_iter()
            .find(|l| l.as_str() == value)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Lifetime::ALL.iter().map(|l| l.as_str()).collect();
                format!("invalid lifetime {value:?}: must be one of {}", allowed.join(", "))
            })
    }
}

/// How many times a secret may be fetched. Serialized as `-1` for unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", from = "i64")]
pub enum AccessLimit {
    Unlimited,
    Limited(u8),
}

impl AccessLimit {
    /// A limited policy, clamped to `1..=108`.
    pub fn limited(count: i64) -> Self {
        AccessLimit::Limited(count.clamp(1, MAX_ACCESSES) as u8)
    }
}

impl From<AccessLimit> for i64 {
    fn from(limit: AccessLimit) -> Self {
        match limit {
            AccessLimit::Unlimited => -1,
            AccessLimit::Limited(n) => i64::from(n),
        }
    }
}

impl From<i64> for AccessLimit {
    fn from(value: i64) -> Self {
        if value < 0 {
            AccessLimit::Unlimited
        } else {
            AccessLimit::limited(value)
        }
    }
}

impl fmt::Display for AccessLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLimit::Unlimited => write!(f, "unlimited"),
            AccessLimit::Limited(n) => write!(f, "{n}"),
        }
    }
}

/// What is being shared: plain text or an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretPayload {
    Text(String),
    File { filename: String, bytes: Vec<u8> },
}

/// Body of `POST /secrets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequest {
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub accesses: AccessLimit,
    pub lifetime: Lifetime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub is_base64: bool,
}

impl SecretRequest {
    pub fn new(
        payload: SecretPayload,
        password: Option<String>,
        accesses: AccessLimit,
        lifetime: Lifetime,
    ) -> Self {
        let password = password.filter(|p| !p.is_empty());
        match payload {
            SecretPayload::Text(secret) => Self {
                secret,
                password,
                accesses,
                lifetime,
                filename: None,
                is_base64: false,
            },
            SecretPayload::File { filename, bytes } => Self {
                secret: encoding::encode_file(&bytes),
                password,
                accesses,
                lifetime,
                filename: Some(filename).filter(|f| !f.is_empty()),
                is_base64: true,
            },
        }
    }
}

/// Reply to a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires: OffsetDateTime,
}

/// Reply to `GET /secrets/{token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default)]
    pub is_base64: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(default)]
    pub accesses: i64,
    #[serde(default)]
    pub destroyed: bool,
}

impl SecretRecord {
    /// Decode the record back into what was originally shared.
    pub fn payload(&self) -> crate::Result<SecretPayload> {
        if self.is_base64 {
            Ok(SecretPayload::File {
                filename: self.filename.clone().unwrap_or_default(),
                bytes: encoding::decode_file(&self.secret)?,
            })
        } else {
            Ok(SecretPayload::Text(self.secret.clone()))
        }
    }
}

/// Health of the API as reported by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceState {
    Ok,
    Unhealthy,
    Maintenance,
    NotReady,
    Other(String),
}

impl From<String> for ServiceState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ok" => ServiceState::Ok,
            "unhealthy" => ServiceState::Unhealthy,
            "maintenance" | "maintainance" => ServiceState::Maintenance,
            "not ready" => ServiceState::NotReady,
            _ => ServiceState::Other(value),
        }
    }
}

impl From<ServiceState> for String {
    fn from(state: ServiceState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Ok => write!(f, "ok"),
            ServiceState::Unhealthy => write!(f, "unhealthy"),
            ServiceState::Maintenance => write!(f, "maintenance"),
            ServiceState::NotReady => write!(f, "not ready"),
            ServiceState::Other(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: ServiceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}
