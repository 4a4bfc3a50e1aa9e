//! Request and response shapes of the Tencent Cloud APIs used by the plugin.
//!
//! Field names follow the upstream PascalCase convention on the wire.
use serde::{Deserialize, Serialize};

/// Envelope wrapping every API response.
///
/// The action's result fields are kept as raw JSON so that they are only
/// decoded once the response is known not to be an error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Envelope {
    pub response: ResponseBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResponseBody {
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default)]
    pub request_id: String,
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ApiError {
    pub code: String,
    pub message: String,
}

/// A region returned by the CVM `DescribeRegions` action.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegionInfo {
    /// Region identifier, e.g. `ap-guangzhou`.
    pub region: String,
    /// Human readable region name.
    pub region_name: String,
    /// Whether the region is available, e.g. `AVAILABLE`.
    #[serde(default)]
    pub region_state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeRegionsResponse {
    #[serde(default)]
    pub region_set: Vec<RegionInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeBaseMetricsRequest<'a> {
    pub namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeBaseMetricsResponse {
    #[serde(default)]
    pub metric_set: Vec<MetricSet>,
}

/// Description of one metric in a namespace.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetricSet {
    /// Namespace the metric belongs to.
    pub namespace: String,
    /// Metric name, e.g. `CpuUsage`.
    pub metric_name: String,
    /// Unit of the metric.
    pub unit: String,
    /// Unit of the metric, in Chinese.
    pub unit_cname: String,
    /// Supported statistical periods, in seconds.
    pub period: Vec<u64>,
    /// Metric meaning.
    pub meaning: Option<MetricMeaning>,
    /// Sets of dimension keys the metric can be filtered by.
    pub dimensions: Vec<DimensionsDesc>,
    /// Chinese display name.
    pub metric_c_name: String,
    /// English display name.
    pub metric_e_name: String,
}

/// Human readable meaning of a metric.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetricMeaning {
    /// English.
    pub en: String,
    /// Chinese.
    pub zh: String,
}

/// A set of dimension keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DimensionsDesc {
    /// Raw dimension keys, as reported by the namespace.
    pub dimensions: Vec<String>,
}

/// A dimension name/value pair as sent to and returned from `GetMonitorData`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDimension {
    /// Dimension name.
    pub name: String,
    /// Dimension value.
    pub value: String,
}

/// One monitored object, identified by its dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    /// The dimensions identifying the object.
    pub dimensions: Vec<ApiDimension>,
}

/// Parameters of the monitor `GetMonitorData` action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMonitorDataRequest {
    /// Namespace, e.g. `QCE/CVM`.
    pub namespace: String,
    /// Metric name.
    pub metric_name: String,
    /// Statistical period in seconds.
    pub period: u64,
    /// RFC 3339 start time.
    pub start_time: String,
    /// RFC 3339 end time.
    pub end_time: String,
    /// Objects to fetch data for.
    pub instances: Vec<Instance>,
}

/// Result of the monitor `GetMonitorData` action.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetMonitorDataResponse {
    /// Statistical period in seconds.
    pub period: u64,
    /// Metric name.
    pub metric_name: String,
    /// One entry per requested instance.
    pub data_points: Vec<DataPoint>,
    /// Start of the returned range.
    pub start_time: String,
    /// End of the returned range.
    pub end_time: String,
}

/// The series of one instance.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DataPoint {
    /// The dimensions identifying the instance.
    pub dimensions: Vec<ApiDimension>,
    /// Unix timestamps in seconds.
    pub timestamps: Vec<f64>,
    /// Values aligned with `timestamps`; missing points are `null`.
    pub values: Vec<Option<f64>>,
}
