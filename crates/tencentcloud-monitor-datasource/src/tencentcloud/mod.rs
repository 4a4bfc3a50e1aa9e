/*! A minimal client for the Tencent Cloud APIs used by the plugin.

Every call is a signed JSON `POST /` to `https://<service>.tencentcloudapi.com`,
with the action, version and region passed in `X-TC-*` headers.
*/
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::settings::Credentials;

mod sign;
mod types;

pub use types::{
    ApiDimension, DataPoint, DimensionsDesc, GetMonitorDataRequest, GetMonitorDataResponse,
    Instance, MetricMeaning, MetricSet, RegionInfo,
};
use types::{
    DescribeBaseMetricsRequest, DescribeBaseMetricsResponse, DescribeRegionsResponse, Envelope,
};

/// Region used for calls that are not region specific.
pub const DEFAULT_REGION: &str = "ap-guangzhou";

/// Errors returned by [`TencentCloudClient`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The request could not be sent or the response could not be read.
    #[error("error sending request to Tencent Cloud: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint URL could not be built.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// The response body was not the expected JSON.
    #[error("invalid response from Tencent Cloud: {0}")]
    Json(#[from] serde_json::Error),
    /// The API rejected the request.
    #[error("{code}: {message} (RequestId: {request_id})")]
    Api {
        /// The error code, e.g. `AuthFailure.SignatureFailure`.
        code: String,
        /// The error message.
        message: String,
        /// The id of the failed request.
        request_id: String,
    },
    /// The API answered with a non-success status and no error details.
    #[error("unexpected HTTP status {status} from Tencent Cloud")]
    Status {
        /// The HTTP status.
        status: reqwest::StatusCode,
    },
    /// The response contained neither a result nor an error.
    #[error("empty response from Tencent Cloud (RequestId: {request_id})")]
    EmptyResponse {
        /// The id of the request.
        request_id: String,
    },
}

impl Error {
    /// Whether the error was caused by the request, e.g. bad credentials or parameters.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Api { code, .. } => {
                code.starts_with("AuthFailure")
                    || code.starts_with("InvalidParameter")
                    || code.starts_with("MissingParameter")
                    || code.starts_with("UnauthorizedOperation")
                    || code.starts_with("UnsupportedRegion")
            }
            Self::Endpoint(_) => true,
            _ => false,
        }
    }
}

type Result<T> = std::result::Result<T, Error>;

struct Action {
    service: &'static str,
    version: &'static str,
    name: &'static str,
}

const DESCRIBE_REGIONS: Action = Action {
    service: "cvm",
    version: "2017-03-12",
    name: "DescribeRegions",
};

const DESCRIBE_BASE_METRICS: Action = Action {
    service: "monitor",
    version: "2018-07-24",
    name: "DescribeBaseMetrics",
};

const GET_MONITOR_DATA: Action = Action {
    service: "monitor",
    version: "2018-07-24",
    name: "GetMonitorData",
};

/// A Tencent Cloud API client authenticated with a single key pair.
#[derive(Clone, Debug)]
pub struct TencentCloudClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoint: Option<Url>,
}

impl TencentCloudClient {
    /// Create a new client.
    ///
    /// If `endpoint` is set every service is called at that URL instead of
    /// its public endpoint.
    pub fn new(http: reqwest::Client, credentials: Credentials, endpoint: Option<Url>) -> Self {
        Self {
            http,
            credentials,
            endpoint,
        }
    }

    fn url_for(&self, service: &str) -> Result<Url> {
        match &self.endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => Ok(format!("https://{service}.tencentcloudapi.com/").parse()?),
        }
    }

    #[tracing::instrument(
        skip(self, action, request),
        fields(service = action.service, action = action.name),
        level = "debug"
    )]
    async fn call<Req, Resp>(&self, action: &Action, region: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url_for(action.service)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(url::ParseError::EmptyHost.into()),
        };
        let payload = serde_json::to_vec(request)?;
        let now = Utc::now();
        let authorization =
            sign::authorization(&self.credentials, action.service, &host, &payload, now);

        debug!(%url, region, "Calling Tencent Cloud API");
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, sign::CONTENT_TYPE)
            .header("X-TC-Action", action.name)
            .header("X-TC-Version", action.version)
            .header("X-TC-Region", region)
            .header("X-TC-Timestamp", now.timestamp().to_string())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let envelope: Envelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(Error::Status { status }),
            Err(e) => return Err(e.into()),
        };
        let response = envelope.response;
        if let Some(error) = response.error {
            warn!(
                code = %error.code,
                message = %error.message,
                request_id = %response.request_id,
                "Tencent Cloud API returned an error",
            );
            return Err(Error::Api {
                code: error.code,
                message: error.message,
                request_id: response.request_id,
            });
        }
        if response.body.is_empty() {
            return Err(Error::EmptyResponse {
                request_id: response.request_id,
            });
        }
        Ok(serde_json::from_value(serde_json::Value::Object(response.body))?)
    }

    /// List the regions available for CVM.
    pub async fn describe_regions(&self) -> Result<Vec<RegionInfo>> {
        let response: DescribeRegionsResponse = self
            .call(&DESCRIBE_REGIONS, DEFAULT_REGION, &serde_json::json!({}))
            .await?;
        Ok(response.region_set)
    }

    /// List the metrics available in `namespace`.
    pub async fn describe_base_metrics(
        &self,
        region: &str,
        namespace: &str,
    ) -> Result<Vec<MetricSet>> {
        let response: DescribeBaseMetricsResponse = self
            .call(
                &DESCRIBE_BASE_METRICS,
                region,
                &DescribeBaseMetricsRequest { namespace },
            )
            .await?;
        Ok(response.metric_set)
    }

    /// Fetch metric data.
    pub async fn get_monitor_data(
        &self,
        region: &str,
        request: &GetMonitorDataRequest,
    ) -> Result<GetMonitorDataResponse> {
        self.call(&GET_MONITOR_DATA, region, request).await
    }
}

#[cfg(test)]
mod test {
    use mockito::{mock, Matcher};
    use pretty_assertions::assert_eq;

    use super::*;

    fn client() -> TencentCloudClient {
        TencentCloudClient::new(
            reqwest::Client::new(),
            Credentials::new("AKIDTEST", "secret"),
            Some(mockito::server_url().parse().unwrap()),
        )
    }

    #[test]
    fn public_endpoint() {
        let client = TencentCloudClient::new(
            reqwest::Client::new(),
            Credentials::new("AKIDTEST", "secret"),
            None,
        );
        assert_eq!(
            client.url_for("monitor").unwrap().as_str(),
            "https://monitor.tencentcloudapi.com/"
        );
    }

    #[tokio::test]
    async fn describe_regions() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "DescribeRegions")
            .match_header("x-tc-version", "2017-03-12")
            .match_header("x-tc-region", DEFAULT_REGION)
            .match_header(
                "authorization",
                Matcher::Regex(
                    r"^TC3-HMAC-SHA256 Credential=AKIDTEST/\d{4}-\d{2}-\d{2}/cvm/tc3_request, SignedHeaders=content-type;host, Signature=[0-9a-f]{64}$".to_string(),
                ),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"Response": {
                    "TotalCount": 2,
                    "RegionSet": [
                        {"Region": "ap-guangzhou", "RegionName": "华南地区(广州)", "RegionState": "AVAILABLE"},
                        {"Region": "ap-beijing", "RegionName": "华北地区(北京)", "RegionState": "AVAILABLE"}
                    ],
                    "RequestId": "req-regions"
                }}"#,
            )
            .create();

        let regions = client().describe_regions().await.unwrap();
        m.assert();
        assert_eq!(
            regions.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
            vec!["ap-guangzhou", "ap-beijing"]
        );
        assert_eq!(regions[1].region_name, "华北地区(北京)");
    }

    #[tokio::test]
    async fn describe_base_metrics() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "DescribeBaseMetrics")
            .match_header("x-tc-region", "ap-shanghai")
            .match_body(Matcher::Json(serde_json::json!({"Namespace": "QCE/CVM"})))
            .with_status(200)
            .with_body(
                r#"{"Response": {
                    "MetricSet": [{
                        "Namespace": "QCE/CVM",
                        "MetricName": "CpuUsage",
                        "MetricCName": "CPU利用率",
                        "MetricEName": "CPU utilization",
                        "Unit": "%",
                        "UnitCname": "%",
                        "Period": [10, 60, 300],
                        "Dimensions": [{"Dimensions": ["vm_uuid"]}],
                        "Meaning": {"En": "CPU utilization", "Zh": "CPU利用率"}
                    }],
                    "RequestId": "req-metrics"
                }}"#,
            )
            .create();

        let metrics = client()
            .describe_base_metrics("ap-shanghai", "QCE/CVM")
            .await
            .unwrap();
        m.assert();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].metric_name, "CpuUsage");
        assert_eq!(metrics[0].period, vec![10, 60, 300]);
        assert_eq!(metrics[0].dimensions[0].dimensions, vec!["vm_uuid"]);
    }

    #[tokio::test]
    async fn api_error() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "GetMonitorData")
            .with_status(200)
            .with_body(
                r#"{"Response": {
                    "Error": {"Code": "AuthFailure.SecretIdNotFound", "Message": "The SecretId is not found"},
                    "RequestId": "req-error"
                }}"#,
            )
            .create();

        let request = GetMonitorDataRequest {
            namespace: "QCE/CVM".to_string(),
            metric_name: "CpuUsage".to_string(),
            period: 60,
            start_time: "2024-01-01T00:00:00Z".to_string(),
            end_time: "2024-01-01T01:00:00Z".to_string(),
            instances: vec![],
        };
        let err = client()
            .get_monitor_data("ap-guangzhou", &request)
            .await
            .unwrap_err();
        m.assert();
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "AuthFailure.SecretIdNotFound: The SecretId is not found (RequestId: req-error)"
        );
    }

    #[tokio::test]
    async fn malformed_result_is_a_json_error() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "DescribeBaseMetrics")
            .with_status(200)
            .with_body(
                r#"{"Response": {
                    "MetricSet": [{"Period": "not-a-list"}],
                    "RequestId": "req-bad"
                }}"#,
            )
            .create();

        let err = client()
            .describe_base_metrics("ap-guangzhou", "QCE/CVM")
            .await
            .unwrap_err();
        m.assert();
        assert!(matches!(err, Error::Json(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn result_without_fields_is_empty() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "DescribeRegions")
            .with_status(200)
            .with_body(r#"{"Response": {"RequestId": "req-empty"}}"#)
            .create();

        let err = client().describe_regions().await.unwrap_err();
        m.assert();
        assert!(matches!(err, Error::EmptyResponse { ref request_id } if request_id == "req-empty"));
    }

    #[tokio::test]
    async fn non_json_error_status() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "DescribeRegions")
            .with_status(503)
            .with_body("upstream unavailable")
            .create();

        let err = client().describe_regions().await.unwrap_err();
        m.assert();
        assert!(matches!(err, Error::Status { status } if status.as_u16() == 503));
        assert!(!err.is_client_error());
    }
}
