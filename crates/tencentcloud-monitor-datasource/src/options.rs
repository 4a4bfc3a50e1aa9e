/*! Shaping upstream data into option lists for the query editor's selectors.

The Tencent Cloud APIs are not consistent with each other, so a few of these
functions paper over naming differences between namespaces.
*/
use itertools::Itertools;
use serde::Serialize;

use crate::{
    services::ServiceEntry,
    tencentcloud::{DimensionsDesc, MetricSet, RegionInfo},
};

/// A single selectable option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption<T = String> {
    /// Text shown to the user.
    pub label: String,
    /// Value produced when the option is selected.
    pub value: T,
}

impl<T> SelectOption<T> {
    /// Create a new option.
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// An entry of a cascading selector: either a leaf or a group of leaves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GroupedOption {
    /// A selectable namespace.
    Leaf(SelectOption),
    /// A named group holding at least two leaves.
    Group {
        /// The group name.
        label: String,
        /// The group name, repeated as the group's value.
        value: String,
        /// Leaves in input order.
        items: Vec<SelectOption>,
    },
}

/// Group services by their group name into a two-level option tree.
///
/// Groups appear in the order their first member appears in `services`, and
/// members keep their input order. A group with a single member is replaced
/// by that member's leaf.
pub fn service_group_by(services: &[ServiceEntry<'_>]) -> Vec<GroupedOption> {
    let mut groups: Vec<(&str, Vec<SelectOption>)> = Vec::new();
    for entry in services {
        let group_name = entry.group_name();
        let leaf = SelectOption::new(entry.label, entry.namespace.to_string());
        match groups.iter_mut().find(|(label, _)| *label == group_name) {
            Some((_, items)) => items.push(leaf),
            None => groups.push((group_name, vec![leaf])),
        }
    }
    groups
        .into_iter()
        .map(|(label, mut items)| {
            if items.len() == 1 {
                GroupedOption::Leaf(items.remove(0))
            } else {
                GroupedOption::Group {
                    label: label.to_string(),
                    value: label.to_string(),
                    items,
                }
            }
        })
        .collect()
}

/// Dimension keys reported inconsistently by some namespaces, as
/// `(namespace, raw key, canonical key)`.
///
/// Adding a namespace means adding rows here; there is no runtime configuration.
const DIMENSION_RENAMES: &[(&str, &str, &str)] = &[
    ("QCE/CVM", "vm_uuid", "InstanceId"),
    ("QCE/CDB", "instanceid", "InstanceId"),
    ("QCE/CDB", "insttype", "InstanceType"),
];

/// Map a raw dimension key reported for `service` to its canonical name.
pub fn canonical_dimension<'a>(service: &str, key: &'a str) -> &'a str {
    DIMENSION_RENAMES
        .iter()
        .find(|(ns, raw, _)| *ns == service && *raw == key)
        .map_or(key, |(_, _, canonical)| *canonical)
}

/// Turn the raw dimension keys reported for `service` into options, renaming
/// known inconsistent keys.
///
/// One option is produced per input key, in order. Renaming can produce
/// duplicate keys; these are kept.
pub fn hack_dimension<I, S>(service: &str, keys: I) -> Vec<SelectOption>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|key| {
            let key = canonical_dimension(service, key.as_ref());
            SelectOption::new(key, key.to_string())
        })
        .collect()
}

/// Region options, labelled with the region's display name.
pub fn region_options(regions: &[RegionInfo]) -> Vec<SelectOption> {
    regions
        .iter()
        .map(|r| SelectOption::new(&r.region_name, r.region.clone()))
        .collect()
}

/// A metric option, carrying what the editor needs once the metric is selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricOption {
    /// `MetricName(MetricCName)`.
    pub label: String,
    /// The metric name.
    pub value: String,
    /// Supported periods, as reported upstream.
    pub period: Vec<u64>,
    /// Dimension key sets, as reported upstream.
    pub dimensions: Vec<DimensionsDesc>,
    /// The metric's namespace.
    pub namespace: String,
}

/// Metric options, in upstream order.
pub fn metric_options(metrics: &[MetricSet]) -> Vec<MetricOption> {
    metrics
        .iter()
        .map(|m| MetricOption {
            label: format!("{}({})", m.metric_name, m.metric_c_name),
            value: m.metric_name.clone(),
            period: m.period.clone(),
            dimensions: m.dimensions.clone(),
            namespace: m.namespace.clone(),
        })
        .collect()
}

/// Period options, sorted ascending.
pub fn period_options(periods: &[u64]) -> Vec<SelectOption<u64>> {
    periods
        .iter()
        .sorted()
        .map(|p| SelectOption::new(p.to_string(), *p))
        .collect()
}

/// Dimension options for a metric, taken from its first dimension set.
pub fn metric_dimension_options(metric: &MetricSet) -> Vec<SelectOption> {
    metric
        .dimensions
        .first()
        .map(|d| hack_dimension(&metric.namespace, &d.dimensions))
        .unwrap_or_default()
}
