//! The health check run by "Save & test".
use std::convert::Infallible;

use grafana_plugin_sdk::backend;
use tracing::{info, warn};

use super::TencentCloudMonitorPlugin;
use crate::{
    locale::{translate, Key, Language},
    settings::{JsonData, SecureJsonData},
};

/// Build the health check response for `language` from the outcome of the check.
pub fn health_response<E: std::fmt::Display>(
    language: Language,
    outcome: Result<(), E>,
) -> backend::CheckHealthResponse {
    match outcome {
        Ok(()) => backend::CheckHealthResponse::ok(translate(language, Key::HealthOk).to_string()),
        Err(e) => backend::CheckHealthResponse::error(format!(
            "{}: {e}",
            translate(language, Key::HealthFailed)
        )),
    }
}

impl TencentCloudMonitorPlugin {
    /// Check that the credentials are accepted by calling `DescribeRegions`.
    pub async fn check_settings(
        &self,
        json_data: &JsonData,
        secure_json_data: &SecureJsonData,
    ) -> Result<(), super::ResourceError> {
        let regions = self
            .client(json_data, secure_json_data)?
            .describe_regions()
            .await?;
        info!(regions = regions.len(), "Health check succeeded");
        Ok(())
    }
}

#[backend::async_trait]
impl backend::DiagnosticsService for TencentCloudMonitorPlugin {
    type CheckHealthError = Infallible;

    async fn check_health(
        &self,
        request: backend::CheckHealthRequest<Self>,
    ) -> Result<backend::CheckHealthResponse, Self::CheckHealthError> {
        let Some(settings) = request.plugin_context.instance_settings else {
            return Ok(health_response(
                Language::default(),
                Err("missing datasource instance settings"),
            ));
        };
        let language = settings.json_data.language;
        let outcome = self
            .check_settings(&settings.json_data, &settings.decrypted_secure_json_data)
            .await;
        if let Err(e) = &outcome {
            warn!(error = %e, "Health check failed");
        }
        Ok(health_response(language, outcome))
    }

    type CollectMetricsError = Infallible;

    async fn collect_metrics(
        &self,
        _request: backend::CollectMetricsRequest<Self>,
    ) -> Result<backend::CollectMetricsResponse, Self::CollectMetricsError> {
        Ok(backend::CollectMetricsResponse::new(None))
    }
}
