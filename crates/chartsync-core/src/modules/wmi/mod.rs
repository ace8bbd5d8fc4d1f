//! Windows hosts monitored through a windows_exporter (`/metrics`) endpoint.
//!
//! One HTTP scrape per cycle. Sub-collector families present in the scrape get
//! their fixed charts once; cores, volumes, NICs, services, processes and the
//! other per-entity classes get charts the first cycle they are seen.

mod charts;
mod collect;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::charts::ChartSet;
use crate::collector::{CycleController, Module, Snapshot};
use crate::error::{CollectError, ConfigError, TransportError};
use crate::prometheus;
use crate::source::http::parse_url;
use crate::source::{HttpSource, SampleSource};
use crate::util::deserialize_duration;

pub use charts::WmiCharts;
pub use collect::{Family, normalize};

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_update_every() -> Duration {
    Duration::from_secs(5)
}

/// Job configuration of the wmi module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// windows_exporter metrics endpoint, e.g. `http://127.0.0.1:9182/metrics`.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(default = "default_update_every", deserialize_with = "deserialize_duration")]
    pub update_every: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: default_timeout(),
            update_every: default_update_every(),
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct Wmi {
    config: Config,
    source: Option<Box<dyn SampleSource>>,
    controller: CycleController,
    clock: fn() -> i64,
}

impl Wmi {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: None,
            controller: CycleController::new(),
            clock: unix_now,
        }
    }

    /// Uses `source` instead of an HTTP client built from `url`.
    pub fn with_source(config: Config, source: impl SampleSource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &CycleController {
        &self.controller
    }
}

impl Module for Wmi {
    fn name(&self) -> &'static str {
        "wmi"
    }

    fn init(&mut self) -> Result<(), ConfigError> {
        parse_url(&self.config.url)?;
        if self.source.is_none() {
            let source = HttpSource::new(&self.config.url, self.config.timeout)?;
            self.source = Some(Box::new(source));
        }
        Ok(())
    }

    fn try_collect(&mut self) -> Result<Snapshot, CollectError> {
        let Some(source) = self.source.as_mut() else {
            return Err(TransportError::Request("module is not initialized".into()).into());
        };
        let now = (self.clock)();

        self.controller.run_cycle(
            &WmiCharts,
            || Ok(source.fetch()?),
            |body| {
                let samples = prometheus::parse_bytes(&body)?;
                Ok(normalize(&samples, now))
            },
        )
    }

    fn charts(&self) -> &ChartSet {
        self.controller.charts()
    }

    fn cleanup(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use assert_matches::assert_matches;

    use crate::collector::{EntityClass, EntityId};
    use crate::source::MockSource;
    use crate::source::http::tests::{refused_url, serve};

    const V0200_METRICS: &str = include_str!("../../../testdata/wmi/v0.20.0/metrics.txt");
    const NOW: i64 = 1_660_890_557;
    const URL: &str = "http://127.0.0.1:9182/metrics";

    const DISK_D: &str = r#"
windows_logical_disk_free_bytes{volume="D:"} 1.073741824e+10
windows_logical_disk_size_bytes{volume="D:"} 2.147483648e+10
windows_logical_disk_read_bytes_total{volume="D:"} 4096
windows_logical_disk_write_bytes_total{volume="D:"} 8192
windows_logical_disk_reads_total{volume="D:"} 1
windows_logical_disk_writes_total{volume="D:"} 2
windows_logical_disk_read_latency_seconds_total{volume="D:"} 0.5
windows_logical_disk_write_latency_seconds_total{volume="D:"} 0.25
"#;

    fn config() -> Config {
        Config {
            url: URL.to_string(),
            ..Config::default()
        }
    }

    fn prepare(source: MockSource) -> Wmi {
        let mut wmi = Wmi::with_source(config(), source);
        wmi.clock = || NOW;
        wmi.init().unwrap();
        wmi
    }

    fn expected_v0200() -> HashMap<String, i64> {
        [
            ("ad_binds_total", 184),
            ("ad_directory_service_threads", 0),
            ("ad_ldap_last_bind_time_seconds", 0),
            ("ad_ldap_searches_total", 1382),
            ("ad_replication_data_intersite_bytes_total_inbound", 0),
            ("ad_replication_data_intersite_bytes_total_outbound", 0),
            ("ad_replication_data_intrasite_bytes_total_inbound", 0),
            ("ad_replication_data_intrasite_bytes_total_outbound", 0),
            ("ad_replication_inbound_objects_filtered_total", 0),
            ("ad_replication_inbound_properties_filtered_total", 0),
            ("ad_replication_inbound_properties_updated_total", 0),
            ("ad_replication_inbound_sync_objects_remaining", 0),
            ("ad_replication_pending_synchronizations", 0),
            ("ad_replication_sync_requests_total", 0),
            ("adfs_ad_login_connection_failures_total", 0),
            ("adfs_certificate_authentications_total", 0),
            ("adfs_db_artifact_failure_total", 0),
            ("adfs_db_artifact_query_time_seconds_total", 0),
            ("adfs_db_config_failure_total", 0),
            ("adfs_db_config_query_time_seconds_total", 101),
            ("adfs_device_authentications_total", 0),
            ("adfs_external_authentications_failure_total", 0),
            ("adfs_external_authentications_success_total", 0),
            ("adfs_extranet_account_lockouts_total", 0),
            ("adfs_federated_authentications_total", 0),
            ("adfs_federation_metadata_requests_total", 1),
            ("adfs_oauth_authorization_requests_total", 0),
            ("adfs_oauth_client_authentication_failure_total", 0),
            ("adfs_oauth_client_authentication_success_total", 0),
            ("adfs_oauth_client_credentials_failure_total", 0),
            ("adfs_oauth_client_credentials_success_total", 0),
            ("adfs_oauth_client_privkey_jtw_authentication_failure_total", 0),
            ("adfs_oauth_client_privkey_jwt_authentications_success_total", 0),
            ("adfs_oauth_client_secret_basic_authentications_failure_total", 0),
            ("adfs_oauth_client_secret_basic_authentications_success_total", 0),
            ("adfs_oauth_client_secret_post_authentications_failure_total", 0),
            ("adfs_oauth_client_secret_post_authentications_success_total", 0),
            ("adfs_oauth_client_windows_authentications_failure_total", 0),
            ("adfs_oauth_client_windows_authentications_success_total", 0),
            ("adfs_oauth_logon_certificate_requests_failure_total", 0),
            ("adfs_oauth_logon_certificate_token_requests_success_total", 0),
            ("adfs_oauth_password_grant_requests_failure_total", 0),
            ("adfs_oauth_password_grant_requests_success_total", 0),
            ("adfs_oauth_token_requests_success_total", 0),
            ("adfs_passive_requests_total", 0),
            ("adfs_passport_authentications_total", 0),
            ("adfs_password_change_failed_total", 0),
            ("adfs_password_change_succeeded_total", 0),
            ("adfs_samlp_token_requests_success_total", 0),
            ("adfs_sso_authentications_failure_total", 0),
            ("adfs_sso_authentications_success_total", 0),
            ("adfs_token_requests_total", 0),
            ("adfs_userpassword_authentications_failure_total", 0),
            ("adfs_userpassword_authentications_success_total", 0),
            ("adfs_windows_integrated_authentications_total", 0),
            ("adfs_wsfed_token_requests_success_total", 0),
            ("adfs_wstrust_token_requests_success_total", 0),
            ("collector_ad_duration", 769),
            ("collector_ad_status_fail", 0),
            ("collector_ad_status_success", 1),
            ("collector_adfs_duration", 3),
            ("collector_adfs_status_fail", 0),
            ("collector_adfs_status_success", 1),
            ("collector_cpu_duration", 0),
            ("collector_cpu_status_fail", 0),
            ("collector_cpu_status_success", 1),
            ("collector_cs_duration", 0),
            ("collector_cs_status_fail", 0),
            ("collector_cs_status_success", 1),
            ("collector_logical_disk_duration", 0),
            ("collector_logical_disk_status_fail", 0),
            ("collector_logical_disk_status_success", 1),
            ("collector_memory_duration", 0),
            ("collector_memory_status_fail", 0),
            ("collector_memory_status_success", 1),
            ("collector_net_duration", 0),
            ("collector_net_status_fail", 0),
            ("collector_net_status_success", 1),
            ("collector_os_duration", 2),
            ("collector_os_status_fail", 0),
            ("collector_os_status_success", 1),
            ("collector_service_duration", 101),
            ("collector_service_status_fail", 0),
            ("collector_service_status_success", 1),
            ("collector_system_duration", 0),
            ("collector_system_status_fail", 0),
            ("collector_system_status_success", 1),
            ("collector_tcp_duration", 0),
            ("collector_tcp_status_fail", 0),
            ("collector_tcp_status_success", 1),
            ("cpu_core_0,0_cstate_c1", 160233437),
            ("cpu_core_0,0_cstate_c2", 0),
            ("cpu_core_0,0_cstate_c3", 0),
            ("cpu_core_0,0_dpc_time", 67109),
            ("cpu_core_0,0_dpcs", 4871900),
            ("cpu_core_0,0_idle_time", 162455593),
            ("cpu_core_0,0_interrupt_time", 77281),
            ("cpu_core_0,0_interrupts", 155194331),
            ("cpu_core_0,0_privileged_time", 1182109),
            ("cpu_core_0,0_user_time", 1073671),
            ("cpu_core_0,1_cstate_c1", 157210125),
            ("cpu_core_0,1_cstate_c2", 0),
            ("cpu_core_0,1_cstate_c3", 0),
            ("cpu_core_0,1_dpc_time", 11484),
            ("cpu_core_0,1_dpcs", 1180900),
            ("cpu_core_0,1_idle_time", 159478125),
            ("cpu_core_0,1_interrupt_time", 46890),
            ("cpu_core_0,1_interrupts", 128513624),
            ("cpu_core_0,1_privileged_time", 1775000),
            ("cpu_core_0,1_user_time", 1944593),
            ("cpu_core_0,2_cstate_c1", 158000750),
            ("cpu_core_0,2_cstate_c2", 0),
            ("cpu_core_0,2_cstate_c3", 0),
            ("cpu_core_0,2_dpc_time", 10500),
            ("cpu_core_0,2_dpcs", 1000000),
            ("cpu_core_0,2_idle_time", 160000500),
            ("cpu_core_0,2_interrupt_time", 50250),
            ("cpu_core_0,2_interrupts", 120000000),
            ("cpu_core_0,2_privileged_time", 1800125),
            ("cpu_core_0,2_user_time", 3000062),
            ("cpu_core_0,3_cstate_c1", 156000500),
            ("cpu_core_0,3_cstate_c2", 0),
            ("cpu_core_0,3_cstate_c3", 0),
            ("cpu_core_0,3_dpc_time", 13312),
            ("cpu_core_0,3_dpcs", 900000),
            ("cpu_core_0,3_idle_time", 159375375),
            ("cpu_core_0,3_interrupt_time", 58937),
            ("cpu_core_0,3_interrupts", 110000000),
            ("cpu_core_0,3_privileged_time", 1799500),
            ("cpu_core_0,3_user_time", 4960500),
            ("cpu_dpc_time", 102405),
            ("cpu_idle_time", 641309593),
            ("cpu_interrupt_time", 233358),
            ("cpu_privileged_time", 6556734),
            ("cpu_user_time", 10978826),
            ("logical_disk_C:_free_space", 43636490240),
            ("logical_disk_C:_read_bytes_total", 17676328448),
            ("logical_disk_C:_read_latency", 97421),
            ("logical_disk_C:_reads_total", 350593),
            ("logical_disk_C:_total_space", 67938287616),
            ("logical_disk_C:_used_space", 24301797376),
            ("logical_disk_C:_write_bytes_total", 9135282688),
            ("logical_disk_C:_write_latency", 123912),
            ("logical_disk_C:_writes_total", 450705),
            ("memory_available_bytes", 1379942400),
            ("memory_cache_faults_total", 8009603),
            ("memory_cache_total", 1392185344),
            ("memory_commit_limit", 5733113856),
            ("memory_committed_bytes", 3447439360),
            ("memory_modified_page_list_bytes", 32653312),
            ("memory_not_committed_bytes", 2285674496),
            ("memory_page_faults_total", 119093924),
            ("memory_pool_nonpaged_bytes_total", 126865408),
            ("memory_pool_paged_bytes", 303906816),
            ("memory_standby_cache_core_bytes", 107376640),
            ("memory_standby_cache_normal_priority_bytes", 1019121664),
            ("memory_standby_cache_reserve_bytes", 233033728),
            ("memory_standby_cache_total", 1359532032),
            ("memory_swap_page_reads_total", 402087),
            ("memory_swap_page_writes_total", 7012),
            ("memory_swap_pages_read_total", 4643279),
            ("memory_swap_pages_written_total", 312896),
            ("memory_used_bytes", 2876776448),
            ("net_nic_vmxnet3_Ethernet_Adapter_bytes_received", 38290755856),
            ("net_nic_vmxnet3_Ethernet_Adapter_bytes_sent", 8211165504),
            ("net_nic_vmxnet3_Ethernet_Adapter_packets_outbound_discarded", 0),
            ("net_nic_vmxnet3_Ethernet_Adapter_packets_outbound_errors", 0),
            ("net_nic_vmxnet3_Ethernet_Adapter_packets_received_discarded", 0),
            ("net_nic_vmxnet3_Ethernet_Adapter_packets_received_errors", 0),
            ("net_nic_vmxnet3_Ethernet_Adapter_packets_received_total", 4120869),
            ("net_nic_vmxnet3_Ethernet_Adapter_packets_sent_total", 1332466),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_bytes_received", 38290755856),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_bytes_sent", 8211165504),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_packets_outbound_discarded", 0),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_packets_outbound_errors", 0),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_packets_received_discarded", 0),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_packets_received_errors", 0),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_packets_received_total", 4120869),
            ("net_nic_Intel_R_PRO_1000_MT_Network_Connection_packets_sent_total", 1332466),
            ("os_paging_free_bytes", 1414107136),
            ("os_paging_limit_bytes", 1476395008),
            ("os_paging_used_bytes", 62287872),
            ("os_physical_memory_free_bytes", 1379946496),
            ("os_processes", 152),
            ("os_processes_limit", 4294967295),
            ("os_users", 2),
            ("os_visible_memory_bytes", 4256718848),
            ("os_visible_memory_used_bytes", 2876772352),
            ("service_dhcp_state_continue_pending", 0),
            ("service_dhcp_state_pause_pending", 0),
            ("service_dhcp_state_paused", 0),
            ("service_dhcp_state_running", 1),
            ("service_dhcp_state_start_pending", 0),
            ("service_dhcp_state_stop_pending", 0),
            ("service_dhcp_state_stopped", 0),
            ("service_dhcp_state_unknown", 0),
            ("service_dhcp_status_degraded", 0),
            ("service_dhcp_status_error", 0),
            ("service_dhcp_status_lost_comm", 0),
            ("service_dhcp_status_no_contact", 0),
            ("service_dhcp_status_nonrecover", 0),
            ("service_dhcp_status_ok", 1),
            ("service_dhcp_status_pred_fail", 0),
            ("service_dhcp_status_service", 0),
            ("service_dhcp_status_starting", 0),
            ("service_dhcp_status_stopping", 0),
            ("service_dhcp_status_stressed", 0),
            ("service_dhcp_status_unknown", 0),
            ("system_threads", 1559),
            ("system_up_time", 2890557),
            ("tcp_ipv4_conns_active", 4301),
            ("tcp_ipv4_conns_established", 7),
            ("tcp_ipv4_conns_failures", 137),
            ("tcp_ipv4_conns_passive", 501),
            ("tcp_ipv4_conns_resets", 1282),
            ("tcp_ipv4_segments_received", 676388),
            ("tcp_ipv4_segments_retransmitted", 2120),
            ("tcp_ipv4_segments_sent", 871379),
            ("tcp_ipv6_conns_active", 214),
            ("tcp_ipv6_conns_established", 0),
            ("tcp_ipv6_conns_failures", 214),
            ("tcp_ipv6_conns_passive", 0),
            ("tcp_ipv6_conns_resets", 0),
            ("tcp_ipv6_segments_received", 1284),
            ("tcp_ipv6_segments_retransmitted", 428),
            ("tcp_ipv6_segments_sent", 856),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Every dimension and variable of every chart has a value in `mx`.
    fn ensure_charts_backed(wmi: &Wmi, mx: &Snapshot) {
        for chart in wmi.charts().iter() {
            for id in chart.referenced_ids() {
                assert!(
                    mx.contains_key(id),
                    "collected metrics has no data for '{}' chart '{}'",
                    id,
                    chart.id
                );
            }
        }
    }

    #[test]
    fn test_init() {
        let mut wmi = Wmi::new(config());
        assert!(wmi.init().is_ok());

        let mut wmi = Wmi::new(Config::default());
        assert_matches!(wmi.init(), Err(ConfigError::Empty("url")));

        let mut wmi = Wmi::new(Config {
            url: "127.0.0.1:9182".into(),
            ..Config::default()
        });
        assert_matches!(wmi.init(), Err(ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_check() {
        assert!(prepare(MockSource::body(V0200_METRICS)).check());
        assert!(!prepare(MockSource::body("hello and\n goodbye")).check());
        assert!(!prepare(MockSource::refused()).check());
        assert!(!prepare(MockSource::status(404)).check());
    }

    #[test]
    fn test_check_over_http() {
        let mut wmi = Wmi::new(Config {
            url: serve("200 OK", V0200_METRICS.as_bytes()),
            ..Config::default()
        });
        wmi.init().unwrap();
        assert!(wmi.check());

        let mut wmi = Wmi::new(Config {
            url: serve("404 Not Found", b""),
            ..Config::default()
        });
        wmi.init().unwrap();
        assert!(!wmi.check());
        assert!(wmi.charts().is_empty());

        let mut wmi = Wmi::new(Config {
            url: refused_url(),
            ..Config::default()
        });
        wmi.init().unwrap();
        assert!(wmi.collect().is_none());
        assert!(wmi.controller().registry().is_empty());
    }

    #[test]
    fn test_collect_without_init_fails() {
        let mut wmi = Wmi::new(config());
        assert_matches!(wmi.try_collect(), Err(CollectError::Transport(_)));
    }

    #[test]
    fn test_collect_v0200() {
        let mut wmi = prepare(MockSource::body(V0200_METRICS));

        let mx = wmi.collect().unwrap();

        assert_eq!(mx, expected_v0200());
        ensure_charts_backed(&wmi, &mx);
    }

    #[test]
    fn test_collect_v0200_charts() {
        let mut wmi = prepare(MockSource::body(V0200_METRICS));
        wmi.collect().unwrap();
        let charts = wmi.charts();

        // Fixed charts of families that are always present.
        for id in [
            "cpu_utilization_total",
            "memory_utilization",
            "memory_swap_utilization",
            "os_processes",
            "os_paging_files_usage",
            "system_threads",
            "system_uptime",
            "tcp_conns_established",
            "tcp_segments_retransmitted",
        ] {
            assert!(charts.has_chart(id), "missing chart '{}'", id);
        }
        for core in ["0,0", "0,1", "0,2", "0,3"] {
            assert!(charts.has_chart(&format!("core_{core}_cpu_utilization")));
            assert!(charts.has_chart(&format!("core_{core}_cpu_cstate")));
        }
        assert!(charts.has_chart("logical_disk_C:_usage"));
        assert!(charts.has_chart("nic_vmxnet3_Ethernet_Adapter_bandwidth"));
        assert!(charts.has_chart("nic_Intel_R_PRO_1000_MT_Network_Connection_bandwidth"));
        assert!(charts.has_chart("service_dhcp_state"));
        assert!(charts.has_chart("collector_service_status"));
        assert!(charts.has_chart("collector_cs_duration"));
        assert!(!charts.has_chart("logical_disk_HarddiskVolume4_usage"));
        assert!(!charts.has_chart("logon_active_sessions_by_type"));

        assert!(charts.has_chart("ad_binds"));
        assert!(charts.has_chart("adfs_oauth_client_privkey_jwt_authentications"));

        // 25 fixed, 12 ad, 31 adfs, 16 core, 4 disk, 8 nic, 2 service, 22 collector.
        assert_eq!(charts.len(), 120);
        assert!(wmi.controller().last_report().unwrap().is_clean());
    }

    #[test]
    fn test_collect_twice_creates_nothing_new() {
        let mut wmi = prepare(MockSource::body(V0200_METRICS));
        wmi.collect().unwrap();
        let charts = wmi.charts().clone();
        let registry = wmi.controller().registry().clone();

        let mx = wmi.collect().unwrap();

        assert_eq!(wmi.charts(), &charts);
        assert_eq!(wmi.controller().registry(), &registry);
        assert!(wmi.controller().last_report().unwrap().materialized.is_empty());
        ensure_charts_backed(&wmi, &mx);
    }

    #[test]
    fn test_new_disk_in_second_cycle() {
        let second = format!("{V0200_METRICS}{DISK_D}");
        let mut wmi = prepare(MockSource::body(V0200_METRICS).then_body(second));

        wmi.collect().unwrap();
        let before: Vec<_> = wmi.charts().iter().cloned().collect();
        assert!(!wmi.charts().has_chart("logical_disk_D:_usage"));

        let mx = wmi.collect().unwrap();

        assert_eq!(mx["logical_disk_D:_used_space"], 10_737_418_240);
        assert_eq!(mx["logical_disk_D:_read_latency"], 500);
        for id in [
            "logical_disk_D:_usage",
            "logical_disk_D:_bandwidth",
            "logical_disk_D:_operations",
            "logical_disk_D:_latency",
        ] {
            assert!(wmi.charts().has_chart(id), "missing chart '{}'", id);
        }
        assert_eq!(wmi.charts().len(), before.len() + 4);
        for chart in &before {
            assert_eq!(wmi.charts().get_chart(&chart.id), Some(chart));
        }
        ensure_charts_backed(&wmi, &mx);
    }

    #[test]
    fn test_memory_utilization_created_when_cs_arrives_later() {
        let without_cs: String = V0200_METRICS
            .lines()
            .filter(|line| !line.starts_with("windows_cs_"))
            .map(|line| format!("{line}\n"))
            .collect();
        let mut wmi = prepare(MockSource::body(without_cs).then_body(V0200_METRICS));

        let mx = wmi.collect().unwrap();
        assert!(!mx.contains_key("memory_used_bytes"));
        assert!(!wmi.charts().has_chart("memory_utilization"));
        assert!(wmi.charts().has_chart("memory_page_faults"));
        let memory = EntityId::new("memory");
        assert!(wmi.controller().registry().pending(EntityClass::Family, &memory).is_some());

        let mx = wmi.collect().unwrap();

        assert_eq!(mx["memory_used_bytes"], 2_876_776_448);
        let chart = wmi.charts().get_chart("memory_utilization").unwrap();
        assert!(chart.has_dim("memory_used_bytes"));
        assert!(wmi.controller().registry().is_materialized(EntityClass::Family, &memory));
        assert!(wmi.controller().last_report().unwrap().is_clean());
        ensure_charts_backed(&wmi, &mx);

        let charted: HashSet<&str> = wmi.charts().iter().flat_map(|c| c.referenced_ids()).collect();
        for key in mx.keys().filter(|k| k.starts_with("memory_")) {
            assert!(charted.contains(key.as_str()), "metric '{}' is not charted", key);
        }
    }

    #[test]
    fn test_failed_cycle_keeps_state() {
        let mut wmi = prepare(
            MockSource::body(V0200_METRICS)
                .then(crate::source::MockResponse::Status(404))
                .then_body("hello and\n goodbye"),
        );
        wmi.collect().unwrap();
        let charts = wmi.charts().clone();
        let registry = wmi.controller().registry().clone();

        assert!(wmi.collect().is_none());
        assert!(wmi.collect().is_none());

        assert_eq!(wmi.charts(), &charts);
        assert_eq!(wmi.controller().registry(), &registry);
        assert_eq!(wmi.controller().cycles(), 1);
    }

    #[test]
    fn test_invalid_data_leaves_registry_empty() {
        let mut wmi = prepare(MockSource::body("hello and\n goodbye"));

        assert_matches!(wmi.try_collect(), Err(CollectError::BadPayload(_)));
        assert!(wmi.controller().registry().is_empty());
        assert!(wmi.charts().is_empty());
    }

    #[test]
    fn test_unrelated_exposition_yields_nothing() {
        let mut wmi = prepare(MockSource::body("go_goroutines 12\nprocess_open_fds 7\n"));
        assert!(wmi.collect().is_none());
        assert!(wmi.charts().is_empty());
    }

    #[test]
    fn test_mssql_instance_and_databases() {
        let body = r#"
windows_mssql_genstats_user_connections{mssql_instance="SQLEXPRESS"} 1
windows_mssql_genstats_blocked_processes{mssql_instance="SQLEXPRESS"} 0
windows_mssql_databases_transactions{database="tempdb",mssql_instance="SQLEXPRESS"} 1558
windows_mssql_databases_active_transactions{database="tempdb",mssql_instance="SQLEXPRESS"} 0
windows_mssql_databases_write_transactions{database="tempdb",mssql_instance="SQLEXPRESS"} 29
windows_mssql_databases_log_flushes{database="tempdb",mssql_instance="SQLEXPRESS"} 2
windows_mssql_databases_log_flushed_bytes{database="tempdb",mssql_instance="SQLEXPRESS"} 118784
windows_mssql_databases_backup_restore_operations{database="tempdb",mssql_instance="SQLEXPRESS"} 0
windows_mssql_databases_data_files_size_bytes{database="tempdb",mssql_instance="SQLEXPRESS"} 8.388608e+06
"#;
        let mut wmi = prepare(MockSource::body(body));
        let mx = wmi.collect().unwrap();

        let charts = wmi.charts();
        assert!(charts.has_chart("mssql_instance_SQLEXPRESS_user_connection"));
        assert!(charts.has_chart("mssql_instance_SQLEXPRESS_blocked_process"));
        // Inputs for the other instance charts were not scraped.
        assert!(!charts.has_chart("mssql_instance_SQLEXPRESS_cache_hit_ratio"));
        assert!(charts.has_chart("mssql_db_tempdb_instance_SQLEXPRESS_transactions"));
        assert!(charts.has_chart("mssql_db_tempdb_instance_SQLEXPRESS_data_files_size"));
        assert!(wmi.controller().registry().is_materialized(
            EntityClass::MssqlDatabase,
            &EntityId::pair("SQLEXPRESS", "tempdb")
        ));
        ensure_charts_backed(&wmi, &mx);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut wmi = Wmi::new(config());
        wmi.cleanup();
        wmi.init().unwrap();
        wmi.cleanup();
        wmi.cleanup();
    }

    #[test]
    fn test_config_from_yaml() {
        let cfg: Config = serde_yaml::from_str("url: http://10.0.0.5:9182/metrics\ntimeout: 2s\n").unwrap();
        assert_eq!(cfg.url, "http://10.0.0.5:9182/metrics");
        assert_eq!(cfg.timeout, Duration::from_secs(2));
        assert_eq!(cfg.update_every, Duration::from_secs(5));

        let cfg: Config = serde_yaml::from_str("url: http://h/metrics\nupdate_every: 10\n").unwrap();
        assert_eq!(cfg.update_every, Duration::from_secs(10));
    }
}
