//! The resource service: lookups used by the query editor.
//!
//! All routes are `GET` and answer with JSON:
//!
//! | path                            | parameters                      |
//! |---------------------------------|---------------------------------|
//! | `/cvm-regions`                  |                                 |
//! | `/monitor/describeBaseMetrics`  | `namespace`, `region`           |
//! | `/options/namespaces`           |                                 |
//! | `/options/regions`              |                                 |
//! | `/options/metrics`              | `namespace`, `region`           |
//! | `/options/periods`              | `namespace`, `region`, `metric` |
//! | `/options/dimensions`           | `namespace`, `region`, `metric` |
//! | `/locale`                       | `language` (optional)           |
use std::collections::HashMap;

use bytes::Bytes;
use grafana_plugin_sdk::backend;
use http::{Method, Response, StatusCode, Uri};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::TencentCloudMonitorPlugin;
use crate::{
    locale::{self, Language, UnknownLanguage},
    options,
    services::SERVICES,
    settings::{self, JsonData, SecureJsonData},
    tencentcloud::{self, MetricSet},
};

/// An error answering a resource request.
///
/// Converted into a JSON `{"error": ...}` response with a matching status code.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No route matches the path.
    #[error("Path not found")]
    NotFound,

    /// The route exists but only answers `GET`.
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    /// A required query parameter is absent or empty.
    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    /// The `language` parameter is not a supported tag.
    #[error("{0}")]
    InvalidLanguage(#[from] UnknownLanguage),

    /// The requested metric is not in the namespace.
    #[error("Metric {metric} not found in {namespace}")]
    MetricNotFound {
        /// The namespace searched.
        namespace: String,
        /// The metric asked for.
        metric: String,
    },

    /// The request did not come from a datasource instance.
    #[error("Missing datasource instance settings")]
    MissingInstanceSettings,

    /// The datasource credentials are incomplete.
    #[error("Invalid datasource settings: {0}")]
    Settings(#[from] settings::Error),

    /// The upstream call failed.
    #[error("{0}")]
    TencentCloud(#[from] tencentcloud::Error),

    /// The response could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
}

impl ResourceError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::MetricNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingParameter(_)
            | Self::InvalidLanguage(_)
            | Self::MissingInstanceSettings
            | Self::Settings(_) => StatusCode::BAD_REQUEST,
            Self::TencentCloud(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::TencentCloud(_) => StatusCode::BAD_GATEWAY,
            Self::Json(_) | Self::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl backend::ErrIntoHttpResponse for ResourceError {
    fn into_http_response(self) -> Result<Response<Bytes>, Box<dyn std::error::Error>> {
        Ok(Response::builder()
            .status(self.status())
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(serde_json::to_vec(
                &json!({"error": self.to_string()}),
            )?))?)
    }
}

/// A parsed resource request.
///
/// Fields named `namespace`, `region` and `metric` come from the query
/// parameters of the same name.
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    /// `/cvm-regions`: raw `DescribeRegions` result.
    CvmRegions,
    /// `/monitor/describeBaseMetrics`: raw `DescribeBaseMetrics` result.
    DescribeBaseMetrics { namespace: String, region: String },
    /// `/options/namespaces`: the grouped namespace catalog.
    Namespaces,
    /// `/options/regions`: region options.
    RegionOptions,
    /// `/options/metrics`: metric options for a namespace.
    MetricOptions { namespace: String, region: String },
    /// `/options/periods`: sorted periods of one metric.
    PeriodOptions {
        namespace: String,
        region: String,
        metric: String,
    },
    /// `/options/dimensions`: normalized dimensions of one metric.
    DimensionOptions {
        namespace: String,
        region: String,
        metric: String,
    },
    /// `/locale`: the text table, in `language` if given.
    Locale { language: Option<Language> },
}

struct Params(HashMap<String, String>);

impl Params {
    fn parse(uri: &Uri) -> Self {
        Self(
            url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
                .into_owned()
                .collect(),
        )
    }

    fn optional(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ResourceError> {
        self.optional(name)
            .map(str::to_string)
            .ok_or(ResourceError::MissingParameter(name))
    }
}

type RouteBuilder = fn(&Params) -> Result<Route, ResourceError>;

impl Route {
    /// Match a request to a route.
    ///
    /// The path is matched first, then the method, then the query parameters.
    pub fn parse(method: &Method, uri: &Uri) -> Result<Self, ResourceError> {
        let build: RouteBuilder = match uri.path().trim_matches('/') {
            "cvm-regions" => |_| Ok(Self::CvmRegions),
            "monitor/describeBaseMetrics" => |p| {
                Ok(Self::DescribeBaseMetrics {
                    namespace: p.required("namespace")?,
                    region: p.required("region")?,
                })
            },
            "options/namespaces" => |_| Ok(Self::Namespaces),
            "options/regions" => |_| Ok(Self::RegionOptions),
            "options/metrics" => |p| {
                Ok(Self::MetricOptions {
                    namespace: p.required("namespace")?,
                    region: p.required("region")?,
                })
            },
            "options/periods" => |p| {
                Ok(Self::PeriodOptions {
                    namespace: p.required("namespace")?,
                    region: p.required("region")?,
                    metric: p.required("metric")?,
                })
            },
            "options/dimensions" => |p| {
                Ok(Self::DimensionOptions {
                    namespace: p.required("namespace")?,
                    region: p.required("region")?,
                    metric: p.required("metric")?,
                })
            },
            "locale" => |p| {
                Ok(Self::Locale {
                    language: p
                        .optional("language")
                        .map(str::parse::<Language>)
                        .transpose()?,
                })
            },
            _ => return Err(ResourceError::NotFound),
        };
        if method != Method::GET {
            return Err(ResourceError::MethodNotAllowed(method.clone()));
        }
        build(&Params::parse(uri))
    }
}

fn find_metric(
    metrics: Vec<MetricSet>,
    namespace: String,
    metric: String,
) -> Result<MetricSet, ResourceError> {
    metrics
        .into_iter()
        .find(|m| m.metric_name == metric)
        .ok_or(ResourceError::MetricNotFound { namespace, metric })
}

impl TencentCloudMonitorPlugin {
    /// Answer a parsed resource request.
    ///
    /// `settings` is `None` when the request did not come from a datasource instance.
    pub async fn handle_resource(
        &self,
        route: Route,
        settings: Option<(&JsonData, &SecureJsonData)>,
    ) -> Result<Value, ResourceError> {
        let client = || {
            let (json_data, secure_json_data) =
                settings.ok_or(ResourceError::MissingInstanceSettings)?;
            Ok::<_, ResourceError>(self.client(json_data, secure_json_data)?)
        };
        let value = match route {
            Route::CvmRegions => json!({ "cvmRegions": client()?.describe_regions().await? }),
            Route::DescribeBaseMetrics { namespace, region } => json!({
                "metrics": client()?.describe_base_metrics(&region, &namespace).await?
            }),
            Route::Namespaces => serde_json::to_value(options::service_group_by(SERVICES))?,
            Route::RegionOptions => {
                let regions = client()?.describe_regions().await?;
                serde_json::to_value(options::region_options(&regions))?
            }
            Route::MetricOptions { namespace, region } => {
                let metrics = client()?.describe_base_metrics(&region, &namespace).await?;
                serde_json::to_value(options::metric_options(&metrics))?
            }
            Route::PeriodOptions {
                namespace,
                region,
                metric,
            } => {
                let metrics = client()?.describe_base_metrics(&region, &namespace).await?;
                let metric = find_metric(metrics, namespace, metric)?;
                serde_json::to_value(options::period_options(&metric.period))?
            }
            Route::DimensionOptions {
                namespace,
                region,
                metric,
            } => {
                let metrics = client()?.describe_base_metrics(&region, &namespace).await?;
                let metric = find_metric(metrics, namespace, metric)?;
                serde_json::to_value(options::metric_dimension_options(&metric))?
            }
            Route::Locale { language } => {
                let language = language
                    .or_else(|| settings.map(|(json_data, _)| json_data.language))
                    .unwrap_or_default();
                serde_json::to_value(locale::table(language))?
            }
        };
        Ok(value)
    }
}

#[backend::async_trait]
impl backend::ResourceService for TencentCloudMonitorPlugin {
    type Error = ResourceError;
    type InitialResponse = Response<Bytes>;
    type Stream = backend::BoxResourceStream<Self::Error>;

    #[tracing::instrument(skip(self, r), fields(path = %r.request.uri().path()))]
    async fn call_resource(
        &self,
        r: backend::CallResourceRequest<Self>,
    ) -> Result<(Self::InitialResponse, Self::Stream), Self::Error> {
        let route = Route::parse(r.request.method(), r.request.uri())?;
        debug!(?route, "Handling resource request");
        let settings = r
            .plugin_context
            .instance_settings
            .as_ref()
            .map(|s| (&s.json_data, &s.decrypted_secure_json_data));
        let body = self.handle_resource(route, settings).await?;
        let response = Response::builder()
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(serde_json::to_vec(&body)?))?;
        Ok((response, Box::pin(futures_util::stream::empty())))
    }
}
