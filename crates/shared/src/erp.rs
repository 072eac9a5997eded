//! Client for the legacy ERP employee feed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ErpConfig;

/// ERP client errors.
#[derive(Debug, Error)]
pub enum ErpError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build ERP client: {0}")]
    Client(String),
    /// Transport failure or non-success status.
    #[error("ERP request failed: {0}")]
    Request(String),
    /// Body did not match the expected shape.
    #[error("Unexpected ERP payload: {0}")]
    Payload(String),
}

/// One employee as reported by the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEmployee {
    /// Employee number, the natural key shared with the ERP.
    pub employee_number: String,
    /// Full name.
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Department code.
    #[serde(default)]
    pub department_code: Option<String>,
    /// Job title.
    #[serde(default)]
    pub position: Option<String>,
}

/// Anything that can list the authoritative employee roster.
#[async_trait]
pub trait EmployeeSource: Send + Sync {
    /// Fetches every employee the source knows about.
    async fn fetch_employees(&self) -> Result<Vec<RemoteEmployee>, ErpError>;
}

/// HTTP client for the ERP gateway (`GET {base_url}/employees`, basic auth).
#[derive(Debug, Clone)]
pub struct ErpClient {
    client: reqwest::Client,
    config: ErpConfig,
}

impl ErpClient {
    /// Creates a client with the configured per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Client` if the TLS backend cannot be initialised.
    pub fn new(config: ErpConfig) -> Result<Self, ErpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ErpError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn employees_url(&self) -> String {
        format!("{}/employees", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmployeeSource for ErpClient {
    async fn fetch_employees(&self) -> Result<Vec<RemoteEmployee>, ErpError> {
        let url = self.employees_url();
        tracing::debug!(url = %url, "Fetching employees from ERP");

        let mut request = self.client.get(&url);
        if !self.config.username.is_empty() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ErpError::Request(e.to_string()))?;

        response
            .json::<Vec<RemoteEmployee>>()
            .await
            .map_err(|e| ErpError::Payload(e.to_string()))
    }
}
