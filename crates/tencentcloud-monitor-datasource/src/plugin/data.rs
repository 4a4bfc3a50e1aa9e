//! The data service: turns monitor queries into data frames.
use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::stream::FuturesOrdered;
use grafana_plugin_sdk::{backend, data, prelude::*};
use thiserror::Error;
use tracing::{debug, info};

use super::TencentCloudMonitorPlugin;
use crate::{
    model::MonitorQuery,
    settings::{self, JsonData, SecureJsonData},
    tencentcloud::{self, DataPoint, GetMonitorDataRequest, GetMonitorDataResponse, Instance},
    variables::{has_variable, resolve_variables, VariableMap},
};

/// Name of the time field in returned frames.
pub const TIME_FIELD: &str = "Timestamps";

/// An error that occurred while answering a single query.
#[derive(Debug, Error)]
///
/// Every variant carries the `ref_id` of the query it belongs to.
pub enum QueryError {
    /// The request did not come from a datasource instance.
    #[error("Missing datasource instance settings")]
    MissingInstanceSettings {
        /// The query's `ref_id`.
        ref_id: String,
    },

    /// The datasource credentials are incomplete.
    #[error("Invalid datasource settings: {source}")]
    Settings {
        /// Why the settings were rejected.
        source: settings::Error,
        /// The query's `ref_id`.
        ref_id: String,
    },

    /// A required query field is empty.
    #[error("Query is incomplete: {field} is not set")]
    Incomplete {
        /// The first empty field.
        field: &'static str,
        /// The query's `ref_id`.
        ref_id: String,
    },

    /// A dimension value still references a variable after resolution.
    #[error("Dimension {name} references an unknown variable: {value}")]
    UnresolvedVariable {
        /// The dimension name.
        name: String,
        /// The unresolved value.
        value: String,
        /// The query's `ref_id`.
        ref_id: String,
    },

    /// The `GetMonitorData` call failed.
    #[error("Query error: {source}")]
    TencentCloud {
        /// The client error.
        source: tencentcloud::Error,
        /// The query's `ref_id`.
        ref_id: String,
    },

    /// The frames built from the response were inconsistent.
    #[error("Invalid frame: {source}")]
    Frame {
        /// The frame check error.
        source: data::Error,
        /// The query's `ref_id`.
        ref_id: String,
    },
}

impl backend::DataQueryError for QueryError {
    fn ref_id(self) -> String {
        match self {
            Self::MissingInstanceSettings { ref_id }
            | Self::Settings { ref_id, .. }
            | Self::Incomplete { ref_id, .. }
            | Self::UnresolvedVariable { ref_id, .. }
            | Self::TencentCloud { ref_id, .. }
            | Self::Frame { ref_id, .. } => ref_id,
        }
    }

    fn status(&self) -> backend::DataQueryStatus {
        match self {
            Self::MissingInstanceSettings { .. } | Self::Settings { .. } => {
                backend::DataQueryStatus::Unauthorized
            }
            Self::Incomplete { .. } | Self::UnresolvedVariable { .. } => {
                backend::DataQueryStatus::BadRequest
            }
            Self::TencentCloud { source, .. } if source.is_client_error() => {
                backend::DataQueryStatus::BadRequest
            }
            Self::TencentCloud { .. } => backend::DataQueryStatus::BadGateway,
            Self::Frame { .. } => backend::DataQueryStatus::Internal,
        }
    }
}

/// Format an interval the way Grafana's `$__interval` does, e.g. `30s` or `5m`.
fn format_interval(interval: Duration) -> String {
    let ms = interval.as_millis();
    match ms {
        0 => "0ms".to_string(),
        ms if ms % 3_600_000 == 0 => format!("{}h", ms / 3_600_000),
        ms if ms % 60_000 == 0 => format!("{}m", ms / 60_000),
        ms if ms % 1_000 == 0 => format!("{}s", ms / 1_000),
        ms => format!("{ms}ms"),
    }
}

/// The global variables Grafana defines for every query.
pub fn builtin_variables(from: DateTime<Utc>, to: DateTime<Utc>, interval: Duration) -> VariableMap {
    VariableMap::new()
        .with("__from", from.timestamp_millis().to_string())
        .with("__to", to.timestamp_millis().to_string())
        .with("__interval", format_interval(interval))
        .with("__interval_ms", interval.as_millis().to_string())
}

/// Build the `GetMonitorData` request for a query.
pub fn monitor_data_request(
    query: &MonitorQuery,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> GetMonitorDataRequest {
    GetMonitorDataRequest {
        namespace: query.service.clone(),
        metric_name: query.metric.clone(),
        period: query.period,
        start_time: from.to_rfc3339_opts(SecondsFormat::Secs, true),
        end_time: to.to_rfc3339_opts(SecondsFormat::Secs, true),
        instances: vec![Instance {
            dimensions: query.dimensions.iter().cloned().map(Into::into).collect(),
        }],
    }
}

/// Build one frame per returned data point.
///
/// The value field is named after the metric and labelled with the data
/// point's dimensions. Timestamps that cannot be represented are dropped
/// together with their value.
pub fn response_frames(response: &GetMonitorDataResponse) -> Vec<data::Frame> {
    response
        .data_points
        .iter()
        .map(|point| data_point_frame(&response.metric_name, point))
        .collect()
}

fn data_point_frame(metric_name: &str, point: &DataPoint) -> data::Frame {
    let labels: BTreeMap<String, String> = point
        .dimensions
        .iter()
        .map(|d| (d.name.clone(), d.value.clone()))
        .collect();
    let (times, values): (Vec<DateTime<Utc>>, Vec<Option<f64>>) = point
        .timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let time = DateTime::from_timestamp(*ts as i64, 0)?;
            Some((time, point.values.get(i).copied().flatten()))
        })
        .unzip();
    data::Frame::new(metric_name)
        .with_field(times.into_field(TIME_FIELD))
        .with_field(values.into_opt_field(metric_name).with_labels(labels))
}

/// The time window a query is evaluated over.
#[derive(Clone, Copy, Debug)]
pub struct QueryWindow {
    /// Start of the time range.
    pub from: DateTime<Utc>,
    /// End of the time range.
    pub to: DateTime<Utc>,
    /// The suggested interval between points.
    pub interval: Duration,
}

impl TencentCloudMonitorPlugin {
    #[tracing::instrument(skip(self, target, window, json_data, secure_json_data))]
    async fn query_frames(
        &self,
        ref_id: &str,
        mut target: MonitorQuery,
        window: QueryWindow,
        json_data: &JsonData,
        secure_json_data: &SecureJsonData,
    ) -> Result<Vec<data::Frame>, QueryError> {
        let ref_id = ref_id.to_string();
        if target.hide {
            debug!("Skipping hidden query");
            return Ok(Vec::new());
        }
        if let Some(field) = target.missing_field() {
            return Err(QueryError::Incomplete { field, ref_id });
        }

        let variables = builtin_variables(window.from, window.to, window.interval);
        resolve_variables(std::iter::once(&mut target), &variables);
        if let Some(d) = target.dimensions.iter().find(|d| has_variable(&d.value)) {
            return Err(QueryError::UnresolvedVariable {
                name: d.name.clone(),
                value: d.value.clone(),
                ref_id,
            });
        }

        let client = match self.client(json_data, secure_json_data) {
            Ok(client) => client,
            Err(source) => return Err(QueryError::Settings { source, ref_id }),
        };
        let request = monitor_data_request(&target, window.from, window.to);
        info!(
            namespace = %request.namespace,
            metric = %request.metric_name,
            region = %target.region,
            period = request.period,
            "Querying monitor data",
        );
        match client.get_monitor_data(&target.region, &request).await {
            Ok(response) => Ok(response_frames(&response)),
            Err(source) => Err(QueryError::TencentCloud { source, ref_id }),
        }
    }

    async fn query(
        &self,
        query: backend::DataQuery<MonitorQuery>,
        json_data: &JsonData,
        secure_json_data: &SecureJsonData,
    ) -> Result<backend::DataResponse, QueryError> {
        let window = QueryWindow {
            from: query.time_range.from,
            to: query.time_range.to,
            interval: query.interval,
        };
        let frames = self
            .query_frames(
                &query.ref_id,
                query.query,
                window,
                json_data,
                secure_json_data,
            )
            .await?;
        let checked = match frames.iter().map(data::Frame::check).collect::<Result<Vec<_>, _>>() {
            Ok(checked) => checked,
            Err(source) => {
                return Err(QueryError::Frame {
                    source,
                    ref_id: query.ref_id,
                })
            }
        };
        Ok(backend::DataResponse::new(query.ref_id, checked))
    }
}

#[backend::async_trait]
impl backend::DataService for TencentCloudMonitorPlugin {
    type Query = MonitorQuery;
    type QueryError = QueryError;
    type Stream = backend::BoxDataResponseStream<Self::QueryError>;

    async fn query_data(
        &self,
        request: backend::QueryDataRequest<Self::Query, Self>,
    ) -> Self::Stream {
        let instance_settings = request.plugin_context.instance_settings;
        Box::pin(
            request
                .queries
                .into_iter()
                .map(|x: backend::DataQuery<Self::Query>| {
                    let plugin = self.clone();
                    let instance_settings = instance_settings.clone();
                    async move {
                        let instance_settings = instance_settings.ok_or_else(|| {
                            QueryError::MissingInstanceSettings {
                                ref_id: x.ref_id.clone(),
                            }
                        })?;
                        plugin
                            .query(
                                x,
                                &instance_settings.json_data,
                                &instance_settings.decrypted_secure_json_data,
                            )
                            .await
                    }
                })
                .collect::<FuturesOrdered<_>>(),
        )
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use grafana_plugin_sdk::backend::DataQueryError;
    use mockito::{mock, Matcher};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        locale::Language,
        model::Dimension,
        tencentcloud::ApiDimension,
        variables::TemplateSrv,
    };

    fn time_range() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).single().unwrap(),
        )
    }

    #[test]
    fn interval_format() {
        assert_eq!(format_interval(Duration::from_millis(0)), "0ms");
        assert_eq!(format_interval(Duration::from_millis(250)), "250ms");
        assert_eq!(format_interval(Duration::from_secs(30)), "30s");
        assert_eq!(format_interval(Duration::from_secs(300)), "5m");
        assert_eq!(format_interval(Duration::from_secs(7200)), "2h");
    }

    #[test]
    fn builtins() {
        let (from, to) = time_range();
        let vars = builtin_variables(from, to, Duration::from_secs(60));
        assert_eq!(vars.replace("$__from"), "1704067200000");
        assert_eq!(vars.replace("${__to}"), "1704070800000");
        assert_eq!(vars.replace("$__interval"), "1m");
        assert_eq!(vars.replace("$__interval_ms"), "60000");
    }

    #[test]
    fn request_from_query() {
        let (from, to) = time_range();
        let query = MonitorQuery {
            service: "QCE/CVM".to_string(),
            region: "ap-guangzhou".to_string(),
            metric: "CpuUsage".to_string(),
            period: 60,
            dimensions: vec![Dimension::new("InstanceId", "ins-123")],
            hide: false,
        };
        let request = monitor_data_request(&query, from, to);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "Namespace": "QCE/CVM",
                "MetricName": "CpuUsage",
                "Period": 60,
                "StartTime": "2024-01-01T00:00:00Z",
                "EndTime": "2024-01-01T01:00:00Z",
                "Instances": [{"Dimensions": [{"Name": "InstanceId", "Value": "ins-123"}]}],
            })
        );
    }

    #[test]
    fn frames_per_data_point() {
        let response = GetMonitorDataResponse {
            period: 60,
            metric_name: "CpuUsage".to_string(),
            data_points: vec![
                DataPoint {
                    dimensions: vec![ApiDimension {
                        name: "InstanceId".to_string(),
                        value: "ins-1".to_string(),
                    }],
                    timestamps: vec![1704067200.0, 1704067260.0, 1704067320.0],
                    values: vec![Some(1.5), None, Some(3.0)],
                },
                DataPoint {
                    dimensions: vec![ApiDimension {
                        name: "InstanceId".to_string(),
                        value: "ins-2".to_string(),
                    }],
                    timestamps: vec![1704067200.0],
                    values: vec![],
                },
            ],
            ..Default::default()
        };
        let frames = response_frames(&response);
        assert_eq!(frames.len(), 2);

        let first = &frames[0];
        assert!(first.check().is_ok());
        let fields = first.fields();
        assert_eq!(fields[0].name, TIME_FIELD);
        assert_eq!(fields[1].name, "CpuUsage");
        assert_eq!(fields[1].labels["InstanceId"], "ins-1");
        let values = fields[1].values();
        assert_eq!(values.len(), 3);
        assert!(!values.is_null(0));
        assert!(values.is_null(1));
        assert!(!values.is_null(2));

        let second = frames[1].fields();
        assert_eq!(second[1].labels["InstanceId"], "ins-2");
        assert_eq!(second[1].values().len(), 1);
        assert!(second[1].values().is_null(0));
    }

    #[test]
    fn error_status() {
        let err = QueryError::UnresolvedVariable {
            name: "InstanceId".to_string(),
            value: "$instance".to_string(),
            ref_id: "A".to_string(),
        };
        assert!(matches!(err.status(), backend::DataQueryStatus::BadRequest));
        assert_eq!(err.ref_id(), "A");

        let err = QueryError::TencentCloud {
            source: tencentcloud::Error::Api {
                code: "InternalError".to_string(),
                message: "boom".to_string(),
                request_id: "req".to_string(),
            },
            ref_id: "B".to_string(),
        };
        assert!(matches!(err.status(), backend::DataQueryStatus::BadGateway));
    }

    #[test]
    fn empty_response_has_no_frames() {
        assert!(response_frames(&GetMonitorDataResponse::default()).is_empty());
    }

    fn window() -> QueryWindow {
        let (from, to) = time_range();
        QueryWindow {
            from,
            to,
            interval: Duration::from_secs(60),
        }
    }

    fn cvm_query(dimensions: Vec<Dimension>) -> MonitorQuery {
        MonitorQuery {
            service: "QCE/CVM".to_string(),
            region: "ap-guangzhou".to_string(),
            metric: "CpuUsage".to_string(),
            period: 60,
            dimensions,
            hide: false,
        }
    }

    fn settings() -> (JsonData, SecureJsonData) {
        (
            JsonData {
                secret_id: "AKIDTEST".to_string(),
                language: Language::English,
                endpoint: Some(mockito::server_url().parse().unwrap()),
            },
            SecureJsonData {
                secret_key: Some("secret".to_string()),
            },
        )
    }

    #[tokio::test]
    async fn hidden_query_has_no_frames() {
        let query = MonitorQuery {
            hide: true,
            ..cvm_query(vec![])
        };
        let frames = TencentCloudMonitorPlugin::new()
            .query_frames(
                "A",
                query,
                window(),
                &JsonData::default(),
                &SecureJsonData::default(),
            )
            .await
            .unwrap();
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn incomplete_query() {
        let query = MonitorQuery {
            period: 0,
            ..cvm_query(vec![])
        };
        let (json_data, secure) = settings();
        let err = TencentCloudMonitorPlugin::new()
            .query_frames("A", query, window(), &json_data, &secure)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Incomplete { field: "period", ref_id } if ref_id == "A"
        ));
    }

    #[tokio::test]
    async fn builtin_variables_resolved_before_request() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "GetMonitorData")
            .match_header("x-tc-region", "ap-guangzhou")
            .match_body(Matcher::PartialJson(json!({
                "Namespace": "QCE/CVM",
                "StartTime": "2024-01-01T00:00:00Z",
                "Instances": [{"Dimensions": [
                    {"Name": "InstanceId", "Value": "ins-1"},
                    {"Name": "Interval", "Value": "60000"},
                ]}],
            })))
            .with_status(200)
            .with_body(
                r#"{"Response": {
                    "Period": 60,
                    "MetricName": "CpuUsage",
                    "DataPoints": [{
                        "Dimensions": [{"Name": "InstanceId", "Value": "ins-1"}],
                        "Timestamps": [1704067200, 1704067260],
                        "Values": [1.5, 2.5]
                    }],
                    "RequestId": "req-data"
                }}"#,
            )
            .create();
        let query = cvm_query(vec![
            Dimension::new("InstanceId", "ins-1"),
            Dimension::new("Interval", "$__interval_ms"),
        ]);
        let (json_data, secure) = settings();
        let frames = TencentCloudMonitorPlugin::new()
            .query_frames("A", query, window(), &json_data, &secure)
            .await
            .unwrap();
        m.assert();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].fields()[1].labels["InstanceId"], "ins-1");
        assert_eq!(frames[0].fields()[1].values().len(), 2);
    }

    #[tokio::test]
    async fn unknown_variable_is_not_sent() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "GetMonitorData")
            .with_status(200)
            .expect(0)
            .create();
        let query = cvm_query(vec![Dimension::new("InstanceId", "$unknown")]);
        let (json_data, secure) = settings();
        let err = TencentCloudMonitorPlugin::new()
            .query_frames("B", query, window(), &json_data, &secure)
            .await
            .unwrap_err();
        m.assert();
        assert!(matches!(
            err,
            QueryError::UnresolvedVariable { ref name, ref value, ref ref_id }
                if name == "InstanceId" && value == "$unknown" && ref_id == "B"
        ));
    }

    #[tokio::test]
    async fn upstream_error_keeps_ref_id() {
        let m = mock("POST", "/")
            .match_header("x-tc-action", "GetMonitorData")
            .with_status(200)
            .with_body(
                r#"{"Response": {
                    "Error": {"Code": "InternalError", "Message": "boom"},
                    "RequestId": "req-fail"
                }}"#,
            )
            .create();
        let query = cvm_query(vec![Dimension::new("InstanceId", "ins-1")]);
        let (json_data, secure) = settings();
        let err = TencentCloudMonitorPlugin::new()
            .query_frames("C", query, window(), &json_data, &secure)
            .await
            .unwrap_err();
        m.assert();
        assert!(matches!(err.status(), backend::DataQueryStatus::BadGateway));
        match err {
            QueryError::TencentCloud { source, ref_id } => {
                assert_eq!(ref_id, "C");
                assert!(matches!(source, tencentcloud::Error::Api { ref code, .. } if code == "InternalError"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
