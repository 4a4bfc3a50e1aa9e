use tencentcloud_monitor_datasource::TencentCloudMonitorPlugin;

#[grafana_plugin_sdk::main(
    services(data, diagnostics, resource),
    init_subscriber = true
)]
async fn plugin() -> TencentCloudMonitorPlugin {
    TencentCloudMonitorPlugin::new()
}
