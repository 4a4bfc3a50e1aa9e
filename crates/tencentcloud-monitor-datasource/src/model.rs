//! The query model produced by the query editor.
use serde::{Deserialize, Serialize};

use crate::tencentcloud::ApiDimension;

/// A dimension filter narrowing a metric to a specific resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Dimension {
    /// The dimension name, e.g. `InstanceId`.
    pub name: String,
    /// The dimension value; may be a template variable reference.
    pub value: String,
}

impl Dimension {
    /// Create a new dimension filter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<Dimension> for ApiDimension {
    fn from(other: Dimension) -> Self {
        Self {
            name: other.name,
            value: other.value,
        }
    }
}

/// A single monitor query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorQuery {
    /// The namespace, e.g. `QCE/CVM`.
    pub service: String,
    /// The region to query, e.g. `ap-guangzhou`.
    pub region: String,
    /// The metric name.
    pub metric: String,
    /// The statistical period in seconds; `0` when not selected yet.
    pub period: u64,
    /// Dimension filters.
    pub dimensions: Vec<Dimension>,
    /// Whether the query is disabled in the panel.
    pub hide: bool,
}

impl MonitorQuery {
    /// The first required field that has not been filled in, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.service.is_empty() {
            Some("service")
        } else if self.region.is_empty() {
            Some("region")
        } else if self.metric.is_empty() {
            Some("metric")
        } else if self.period == 0 {
            Some("period")
        } else {
            None
        }
    }
}
