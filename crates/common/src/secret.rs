//! Decoded secret records
//!
//! The secret server hands out JSON documents describing each secret. The
//! content travels base64 encoded; everything else is metadata the
//! filesystem layer turns into file attributes.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Permission bits used when a secret carries no (valid) mode
pub const DEFAULT_MODE: u32 = 0o440;

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("malformed secret document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("secret '{name}' content is not valid base64")]
    Base64 { name: String },
}

/// A secret as decoded from the server
///
/// Secrets are never mutated once built; the cache replaces them wholesale.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    /// Decoded content bytes
    pub content: Bytes,
    /// Content length as advertised by the server
    pub length: u64,
    pub created_at: DateTime<Utc>,
    pub is_versioned: bool,
    /// Octal permission string, e.g. "0400"
    pub mode: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
}

impl Secret {
    /// Permission bits for the secret's file, masked to `0o777`
    pub fn mode_value(&self) -> u32 {
        self.mode
            .as_deref()
            .map(str::trim)
            .filter(|mode| !mode.is_empty())
            .and_then(|mode| u32::from_str_radix(mode, 8).ok())
            .map(|mode| mode & 0o777)
            .unwrap_or(DEFAULT_MODE)
    }

    /// Length of the decoded content
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// Content is redacted.
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("content", &format_args!("<{} bytes>", self.content.len()))
            .field("length", &self.length)
            .field("created_at", &self.created_at)
            .field("is_versioned", &self.is_versioned)
            .field("mode", &self.mode)
            .field("owner", &self.owner)
            .field("group", &self.group)
            .finish()
    }
}

/// Wire shape of a secret document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecret {
    #[serde(default)]
    name: String,
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    secret_length: Option<u64>,
    #[serde(default)]
    creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    is_versioned: bool,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    group: Option<String>,
}

impl TryFrom<RawSecret> for Secret {
    type Error = SecretError;

    fn try_from(raw: RawSecret) -> Result<Self, Self::Error> {
        let content = match raw.secret.as_deref() {
            Some(encoded) => decode_content(encoded).ok_or_else(|| SecretError::Base64 {
                name: raw.name.clone(),
            })?,
            None => Bytes::new(),
        };
        let length = raw.secret_length.unwrap_or(content.len() as u64);

        Ok(Secret {
            name: raw.name,
            content,
            length,
            created_at: raw.creation_date.unwrap_or_default(),
            is_versioned: raw.is_versioned,
            mode: raw.mode,
            owner: raw.owner,
            group: raw.group,
        })
    }
}

fn decode_content(encoded: &str) -> Option<Bytes> {
    let encoded = encoded.trim();
    STANDARD_LENIENT
        .decode(encoded)
        .or_else(|_| URL_SAFE_LENIENT.decode(encoded))
        .ok()
        .map(Bytes::from)
}

/// Decode a single secret document
pub fn parse_secret(data: &[u8]) -> Result<Secret, SecretError> {
    let raw: RawSecret = serde_json::from_slice(data)?;
    raw.try_into()
}

/// Decode a JSON array of secret documents
///
/// Listings may omit content, in which case the secrets come back empty.
pub fn parse_secret_list(data: &[u8]) -> Result<Vec<Secret>, SecretError> {
    let raw: Vec<RawSecret> = serde_json::from_slice(data)?;
    raw.into_iter().map(Secret::try_from).collect()
}
