use super::error::HueError;
use super::models::{HueConfig, LightState};
use serde::Deserialize;
use std::time::Duration;

/// Minimal REST client for the bridge's light state endpoint.
#[derive(Clone)]
pub struct HueClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct HueErrorResponse {
    #[serde(rename = "type")]
    error_type: i32,
    description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StateResponseItem {
    Error { error: HueErrorResponse },
    Success {},
}

impl HueClient {
    pub fn new(config: &HueConfig) -> Result<Self, HueError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("http://{}/api/{}", config.bridge_ip, config.username),
        })
    }

    /// `http://<bridge>/api/<user>/lights/<lamp>/state`
    pub fn state_url(&self, lamp: u32) -> String {
        format!("{}/lights/{}/state", self.base_url, lamp)
    }

    pub async fn put_state(&self, lamp: u32, state: &LightState) -> Result<(), HueError> {
        let resp = self
            .http
            .put(self.state_url(lamp))
            .json(state)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HueError::ApiError(format!(
                "lamp {}: HTTP {}",
                lamp,
                resp.status()
            )));
        }

        let items: Vec<StateResponseItem> = resp.json().await?;
        check_response(lamp, &items)
    }
}

fn check_response(lamp: u32, items: &[StateResponseItem]) -> Result<(), HueError> {
    for item in items {
        if let StateResponseItem::Error { error } = item {
            return Err(HueError::ApiError(format!(
                "lamp {}: {} (type {})",
                lamp, error.description, error.error_type
            )));
        }
    }
    Ok(())
}
