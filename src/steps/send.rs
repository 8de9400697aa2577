// src/steps/send.rs

use std::time::Duration;

use anyhow::{anyhow, Context};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::{GradingContext, GradingStep, StepError, StepFuture};

use super::store::GradingPayload;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";
pub const EVENT_NAME: &str = "gradeflow";

/// POSTs the grading payload to the configured callback URL.
#[derive(Debug, Clone)]
pub struct SendStep {
    client: Client,
}

impl Default for SendStep {
    fn default() -> Self {
        Self::new()
    }
}

impl SendStep {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Value of the `Authorization` header: the password, base64 encoded.
pub fn authorization_value(password: &str) -> String {
    STANDARD.encode(password.as_bytes())
}

impl SendStep {
    async fn send(&self, ctx: &GradingContext) -> Result<(), StepError> {
        let configuration = ctx.configuration();
        let url = configuration
            .callback_url
            .as_deref()
            .ok_or_else(|| anyhow!("no callback url configured"))?;
        let payload = GradingPayload::grading(ctx.grade_details());
        let content = serde_json::to_string(&payload).context("serialising results")?;

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, EVENT_NAME)
            .header(DELIVERY_HEADER, Uuid::new_v4().to_string());
        if let Some(password) = &configuration.callback_password {
            request = request.header("Authorization", authorization_value(password));
        }

        let response = match request.body(content.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                info!("Payload:\n{}", content);
                return Err(anyhow!(
                    "Failed to send grade to callback url {url} / Message: {e}"
                )
                .into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            let body_message = if body.is_empty() {
                " (empty body)".to_string()
            } else {
                format!("\nBody:\n{body}")
            };
            info!("Payload:\n{}", content);
            return Err(anyhow!(
                "Failed to send grade to callback url {url} / HTTP code: {}{body_message}",
                status.as_u16()
            )
            .into());
        }

        info!(status = status.as_u16(), "Successfully sent results");
        Ok(())
    }
}

impl GradingStep for SendStep {
    fn run<'a>(&'a self, ctx: &'a mut GradingContext) -> StepFuture<'a> {
        Box::pin(self.send(ctx))
    }
}
