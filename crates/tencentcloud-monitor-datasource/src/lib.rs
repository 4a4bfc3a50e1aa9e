/*!
A Grafana datasource backend for [Tencent Cloud Monitor].

The crate is split into plain building blocks and the plugin that wires them together:

- [`services`] is the catalogue of supported Cloud Monitor namespaces.
- [`options`] shapes API results into the option lists the query editor renders.
- [`variables`] resolves template variable references inside queries.
- [`locale`] holds the translated text shown to users.
- [`tencentcloud`] is a small signed client for the Tencent Cloud API.
- [`plugin`] implements the Grafana data, resource and diagnostics services.

[Tencent Cloud Monitor]: https://cloud.tencent.com/product/cm
*/
#![deny(missing_docs)]

pub mod locale;
pub mod model;
pub mod options;
pub mod plugin;
pub mod services;
pub mod settings;
pub mod tencentcloud;
pub mod variables;

pub use plugin::TencentCloudMonitorPlugin;
