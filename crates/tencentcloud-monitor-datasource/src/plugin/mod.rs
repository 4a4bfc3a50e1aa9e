/*! The Grafana plugin and its backend services.

- [`data`] answers panel and alerting queries with `GetMonitorData`.
- [`resource`] serves the lookups the query editor needs to populate its selectors.
- [`diagnostics`] implements the datasource health check.
*/
use grafana_plugin_sdk::prelude::*;

use crate::{
    settings::{self, Credentials, JsonData, SecureJsonData},
    tencentcloud::TencentCloudClient,
};

pub mod data;
pub mod diagnostics;
pub mod resource;

pub use data::QueryError;
pub use resource::ResourceError;

/// The Tencent Cloud Monitor datasource plugin.
///
/// Cloning is cheap; clones share one HTTP connection pool.
#[derive(Clone, Debug, Default, GrafanaPlugin)]
#[grafana_plugin(
    plugin_type = "datasource",
    json_data = "JsonData",
    secure_json_data = "SecureJsonData"
)]
pub struct TencentCloudMonitorPlugin {
    http: reqwest::Client,
}

impl TencentCloudMonitorPlugin {
    /// Create a new plugin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an API client for a datasource instance.
    pub fn client(
        &self,
        json_data: &JsonData,
        secure_json_data: &SecureJsonData,
    ) -> Result<TencentCloudClient, settings::Error> {
        let credentials = Credentials::from_settings(json_data, secure_json_data)?;
        Ok(TencentCloudClient::new(
            self.http.clone(),
            credentials,
            json_data.endpoint.clone(),
        ))
    }
}
