//! Datasource instance settings.
use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::locale::Language;

/// Errors loading the datasource settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// `secretId` was not configured.
    #[error("SecretId is not configured")]
    MissingSecretId,
    /// `secretKey` was not configured.
    #[error("SecretKey is not configured")]
    MissingSecretKey,
}

/// The datasource's JSON data, edited in the config editor.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonData {
    /// The API key id.
    pub secret_id: String,
    /// Language used for messages returned to the user.
    pub language: Language,
    /// Base URL used instead of `https://<service>.tencentcloudapi.com`.
    pub endpoint: Option<Url>,
}

/// The datasource's secure JSON data, only ever sent to the backend.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecureJsonData {
    /// The API key secret.
    pub secret_key: Option<String>,
}

impl fmt::Debug for SecureJsonData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureJsonData")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A Tencent Cloud API key pair.
#[derive(Clone)]
pub struct Credentials {
    secret_id: String,
    secret_key: String,
}

impl Credentials {
    /// Create a new key pair.
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Load credentials from the datasource settings, failing if either half is missing.
    pub fn from_settings(json_data: &JsonData, secure: &SecureJsonData) -> Result<Self, Error> {
        if json_data.secret_id.trim().is_empty() {
            return Err(Error::MissingSecretId);
        }
        let secret_key = secure
            .secret_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingSecretKey)?;
        Ok(Self::new(json_data.secret_id.trim(), secret_key.trim()))
    }

    pub(crate) fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .finish_non_exhaustive()
    }
}
