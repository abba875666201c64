// npy-mosaic/src/data/client.rs

use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::array::{FileDescriptor, LoadedArray};
use super::errors::{DecodeError, FetchError};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Read-only client for the array backend
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /list-numpy-files`
    pub async fn list_files(&self) -> Result<Vec<FileDescriptor>, FetchError> {
        let url = format!("{}/list-numpy-files", self.base_url);
        let body = self.get_json(&url).await?;
        let files = parse_file_list(body)?;
        info!("Backend lists {} array files", files.len());
        Ok(files)
    }

    /// `GET /load-numpy-file?filename=...`
    pub async fn load_file(&self, filename: &str) -> Result<LoadedArray, FetchError> {
        let url = format!(
            "{}/load-numpy-file?filename={}",
            self.base_url,
            urlencoding::encode(filename)
        );
        let body = self.get_json(&url).await?;
        parse_loaded_array(filename, body)
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        serde_json::from_str(&text).map_err(|e| FetchError::Protocol(format!("invalid JSON: {}", e)))
    }
}

#[derive(Default)]
pub struct BackendClientBuilder<'a> {
    base_url: Option<&'a str>,
    timeout: Option<&'a Duration>,
}

impl<'a> BackendClientBuilder<'a> {
    pub fn build(&self) -> Result<BackendClient, BackendClientBuilderError> {
        let base_url = self.base_url.unwrap_or(DEFAULT_BACKEND_URL);
        Self::validate_base_url(base_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            Self::validate_timeout(timeout)?;
            builder = builder.timeout(*timeout);
        }
        let client = builder.build()?;
        Ok(BackendClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&mut self, base_url: &'a str) -> &mut Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn timeout(&mut self, timeout: &'a Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    fn validate_base_url(base_url: &str) -> Result<(), BackendClientBuilderError> {
        let rest = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"));
        match rest {
            Some(host) if !host.trim_matches('/').is_empty() => Ok(()),
            _ => Err(BackendClientBuilderError::InvalidBaseUrl(
                base_url.to_string(),
            )),
        }
    }

    fn validate_timeout(timeout: &Duration) -> Result<(), BackendClientBuilderError> {
        if timeout.is_zero() {
            return Err(BackendClientBuilderError::InvalidTimeout);
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum BackendClientBuilderError {
    #[error("backend url must start with http:// or https:// and name a host, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("timeout must be larger than zero")]
    InvalidTimeout,
    #[error(transparent)]
    ClientBuildError(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct LoadPayload {
    data: Value,
    shape: Vec<usize>,
    min: f64,
    max: f64,
    #[serde(default)]
    filename: Option<String>,
}

/// Interpret a `list-numpy-files` body.
///
/// A `files` list wins over an `error` field; anything else is a protocol error.
pub fn parse_file_list(body: Value) -> Result<Vec<FileDescriptor>, FetchError> {
    if let Some(files) = body.get("files").filter(|f| f.is_array()) {
        return serde_json::from_value(files.clone())
            .map_err(|e| FetchError::Protocol(format!("malformed file entry: {}", e)));
    }
    if let Some(error) = body.get("error") {
        return Err(FetchError::ServerReported(value_text(error)));
    }
    Err(FetchError::Protocol("missing \"files\" list".to_string()))
}

/// Interpret a `load-numpy-file` body requested for `filename`.
pub fn parse_loaded_array(filename: &str, body: Value) -> Result<LoadedArray, FetchError> {
    if body.get("data").map_or(false, Value::is_array) {
        let payload: LoadPayload = serde_json::from_value(body)
            .map_err(|e| FetchError::Protocol(format!("malformed array payload: {}", e)))?;
        if let Some(received) = payload.filename.as_deref() {
            if received != filename {
                return Err(DecodeError::FilenameMismatch {
                    requested: filename.to_string(),
                    received: received.to_string(),
                }
                .into());
            }
        }
        let array = LoadedArray::from_nested(
            filename,
            &payload.data,
            payload.shape,
            payload.min,
            payload.max,
        )?;
        return Ok(array);
    }
    if let Some(error) = body.get("error") {
        return Err(FetchError::ServerReported(value_text(error)));
    }
    Err(FetchError::Protocol("missing \"data\" array".to_string()))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
