use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{
    user_agent, AgentConfig, API_TIMEOUT_SECS, PLATFORM, SIGNUP_TIMEOUT_SECS,
    SUBSCRIPTION_TIMEOUT_SECS,
};
use crate::error::AgentError;
use crate::report::Report;
use crate::subscription::SubscriptionInfo;

/// What the report sink receives: the report plus agent metadata.
#[derive(Debug, Serialize)]
pub struct ReportPayload<'a> {
    #[serde(flatten)]
    pub report: &'a Report,
    pub agent_version: &'static str,
    pub platform: &'static str,
}

impl<'a> ReportPayload<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            agent_version: env!("CARGO_PKG_VERSION"),
            platform: PLATFORM,
        }
    }
}

/// Body of `POST /v1/auth/trial`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRequest {
    pub email: String,
    pub name: String,
    pub company: String,
}

impl TrialRequest {
    pub fn new(email: &str, name: &str, company: &str) -> Result<Self, AgentError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AgentError::Config(format!("invalid email: '{}'", email)));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AgentError::Config("name cannot be empty".to_string()));
        }
        Ok(Self {
            email: email.to_string(),
            name: name.to_string(),
            company: company.trim().to_string(),
        })
    }
}

/// Credentials issued for a new trial.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrialAccount {
    pub api_key: String,
    pub project_id: String,
    pub trial_ends_at: DateTime<Utc>,
    #[serde(default)]
    pub analyses_remaining: i64,
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, AgentError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent())
        .build()?)
}

/// Open a trial account. No API key is needed; the server answers 201 with
/// fresh credentials.
pub async fn create_trial(base_url: &str, request: &TrialRequest) -> Result<TrialAccount, AgentError> {
    let url = format!("{}/v1/auth/trial", base_url.trim_end_matches('/'));
    debug!("POST {}", url);

    let resp = http_client(SIGNUP_TIMEOUT_SECS)?
        .post(&url)
        .json(request)
        .send()
        .await?;

    let status = resp.status();
    if status != reqwest::StatusCode::CREATED {
        let body = resp.text().await.unwrap_or_default();
        return Err(AgentError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp.json::<TrialAccount>().await?)
}

/// Client for the CloudPork API.
pub struct ApiClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, AgentError> {
        let http = http_client(API_TIMEOUT_SECS)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let key = config.require_api_key()?;
        Self::new(config.api_base_url.clone(), key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a finished report. Any 2xx is success.
    pub async fn send_report(&self, report: &Report) -> Result<(), AgentError> {
        let url = self.url("/v1/analysis");
        debug!("POST {}", url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ReportPayload::new(report))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("Report {} accepted ({})", report.project_id, status);
        Ok(())
    }

    pub async fn subscription(&self) -> Result<SubscriptionInfo, AgentError> {
        let resp = self
            .http
            .get(self.url("/v1/subscription"))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(SUBSCRIPTION_TIMEOUT_SECS))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json::<SubscriptionInfo>().await?)
    }

    pub async fn validate_api_key(&self) -> Result<(), AgentError> {
        let resp = self
            .http
            .get(self.url("/v1/auth/validate"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::UNAUTHORIZED => Err(AgentError::InvalidApiKey),
            s => Err(AgentError::Api {
                status: s.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }
}
