use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::LOCAL_PROBE_TIMEOUT_SECS;

#[derive(Debug, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

impl TagsResponse {
    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.name == model)
    }
}

fn probe_client() -> Option<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(LOCAL_PROBE_TIMEOUT_SECS))
        .build()
        .ok()
}

fn tags_url(base_url: &str) -> String {
    format!("{}/api/tags", base_url.trim_end_matches('/'))
}

/// Check if the local model daemon answers its tags endpoint.
pub async fn is_daemon_healthy(base_url: &str) -> bool {
    let Some(client) = probe_client() else {
        return false;
    };

    match client.get(tags_url(base_url)).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            debug!("Local daemon probe failed: {}", e);
            false
        }
    }
}

/// Check if `model` is installed in the local daemon.
pub async fn is_model_available(base_url: &str, model: &str) -> bool {
    let Some(client) = probe_client() else {
        return false;
    };

    let resp = match client.get(tags_url(base_url)).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        _ => return false,
    };

    match resp.json::<TagsResponse>().await {
        Ok(tags) => tags.contains(model),
        Err(_) => false,
    }
}
