//! The catalog of Tencent Cloud Monitor namespaces offered in the namespace selector.
use serde::Serialize;

const DOCS: &str = "https://cloud.tencent.com/document/product/248";

/// One selectable metric namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry<'a> {
    /// Short service identifier, e.g. `cvm`.
    pub service: &'a str,
    /// Display label of the namespace.
    pub label: &'a str,
    /// The namespace passed to the monitor API, e.g. `QCE/CVM`.
    ///
    /// This is the value returned when the entry is chosen.
    pub namespace: &'a str,
    /// Link to the metric documentation.
    pub href: &'a str,
    /// The group this entry is shown under; defaults to `label`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<&'a str>,
}

impl<'a> ServiceEntry<'a> {
    /// The name of the group this entry belongs to.
    pub fn group_name(&self) -> &'a str {
        self.group_name.unwrap_or(self.label)
    }
}

macro_rules! entry {
    ($service:literal, $label:literal, $namespace:literal) => {
        ServiceEntry {
            service: $service,
            label: $label,
            namespace: $namespace,
            href: DOCS,
            group_name: None,
        }
    };
    ($service:literal, $label:literal, $namespace:literal, $group:literal) => {
        ServiceEntry {
            service: $service,
            label: $label,
            namespace: $namespace,
            href: DOCS,
            group_name: Some($group),
        }
    };
}

/// Namespaces supported by the query editor, in display order.
pub const SERVICES: &[ServiceEntry<'static>] = &[
    entry!("cvm", "Cloud Virtual Machine", "QCE/CVM"),
    entry!("cbs", "Cloud Block Storage", "QCE/BLOCK_STORAGE"),
    entry!("cdb", "MySQL", "QCE/CDB", "Database"),
    entry!("redis", "Redis", "QCE/REDIS_MEM", "Database"),
    entry!("mongodb", "MongoDB", "QCE/CMONGO", "Database"),
    entry!("postgres", "PostgreSQL", "QCE/POSTGRES", "Database"),
    entry!("sqlserver", "SQL Server", "QCE/SQLSERVER", "Database"),
    entry!("clb", "Public Load Balancer", "QCE/LB_PUBLIC", "Load Balancer"),
    entry!("clb", "Private Load Balancer", "QCE/LB_PRIVATE", "Load Balancer"),
    entry!("nat", "NAT Gateway", "QCE/NAT_GATEWAY", "Networking"),
    entry!("vpngw", "VPN Gateway", "QCE/VPNGW", "Networking"),
    entry!("dcg", "Direct Connect Gateway", "QCE/DCG", "Networking"),
    entry!("lb", "Elastic IP", "QCE/LB"),
    entry!("cos", "Cloud Object Storage", "QCE/COS"),
    entry!("cdn", "Content Delivery Network", "QCE/CDN"),
    entry!("ckafka", "CKafka", "QCE/CKAFKA"),
];
