//! Normalization of windows_exporter samples.
//!
//! Each sample family is routed by its metric-name prefix to one
//! sub-collector. Seconds are converted to milliseconds and truncated;
//! byte and counter values are truncated as they are.

use std::collections::BTreeMap;

use crate::charts::sanitize_id;
use crate::collector::{EntityClass, EntityId, Normalized};
use crate::prometheus::Sample;

/// A windows_exporter sub-collector this module understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Cpu,
    LogicalDisk,
    Net,
    Memory,
    Os,
    System,
    Tcp,
    Logon,
    ThermalZone,
    Process,
    Service,
    Iis,
    Ad,
    Adcs,
    Adfs,
    Mssql,
}

impl Family {
    const ALL: [Family; 16] = [
        Family::Cpu,
        Family::LogicalDisk,
        Family::Net,
        Family::Memory,
        Family::Os,
        Family::System,
        Family::Tcp,
        Family::Logon,
        Family::ThermalZone,
        Family::Process,
        Family::Service,
        Family::Iis,
        Family::Ad,
        Family::Adcs,
        Family::Adfs,
        Family::Mssql,
    ];

    /// Collector name as reported by the exporter.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Cpu => "cpu",
            Family::LogicalDisk => "logical_disk",
            Family::Net => "net",
            Family::Memory => "memory",
            Family::Os => "os",
            Family::System => "system",
            Family::Tcp => "tcp",
            Family::Logon => "logon",
            Family::ThermalZone => "thermalzone",
            Family::Process => "process",
            Family::Service => "service",
            Family::Iis => "iis",
            Family::Ad => "ad",
            Family::Adcs => "adcs",
            Family::Adfs => "adfs",
            Family::Mssql => "mssql",
        }
    }

    pub fn from_name(name: &str) -> Option<Family> {
        Family::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Splits `windows_<family>_<rest>` into the family and `rest`.
    fn route(metric: &str) -> Option<(Family, &str)> {
        let rest = metric.strip_prefix("windows_")?;
        Family::ALL.into_iter().find_map(|f| {
            rest.strip_prefix(f.name())
                .and_then(|r| r.strip_prefix('_'))
                .map(|suffix| (f, suffix))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    One,
    /// Seconds to milliseconds.
    Milli,
    /// Ratio to percent.
    Percent,
}

impl Scale {
    fn apply(self, value: f64) -> i64 {
        match self {
            Scale::One => value as i64,
            Scale::Milli => (value * 1000.0) as i64,
            Scale::Percent => (value * 100.0) as i64,
        }
    }
}

/// Source suffix (after `windows_<family>_`), target suffix, scale.
type Rename = (&'static str, &'static str, Scale);

fn rename(table: &'static [Rename], suffix: &str) -> Option<(&'static str, Scale)> {
    table
        .iter()
        .find(|(from, _, _)| *from == suffix)
        .map(|(_, to, scale)| (*to, *scale))
}

const LOGICAL_DISK: &[Rename] = &[
    ("free_bytes", "free_space", Scale::One),
    ("size_bytes", "total_space", Scale::One),
    ("read_bytes_total", "read_bytes_total", Scale::One),
    ("write_bytes_total", "write_bytes_total", Scale::One),
    ("reads_total", "reads_total", Scale::One),
    ("writes_total", "writes_total", Scale::One),
    ("read_latency_seconds_total", "read_latency", Scale::Milli),
    ("write_latency_seconds_total", "write_latency", Scale::Milli),
];

const NET: &[Rename] = &[
    ("bytes_received_total", "bytes_received", Scale::One),
    ("bytes_sent_total", "bytes_sent", Scale::One),
    ("packets_outbound_discarded_total", "packets_outbound_discarded", Scale::One),
    ("packets_outbound_errors_total", "packets_outbound_errors", Scale::One),
    ("packets_received_discarded_total", "packets_received_discarded", Scale::One),
    ("packets_received_errors_total", "packets_received_errors", Scale::One),
    ("packets_received_total", "packets_received_total", Scale::One),
    ("packets_sent_total", "packets_sent_total", Scale::One),
];

const MEMORY: &[Rename] = &[
    ("available_bytes", "available_bytes", Scale::One),
    ("cache_bytes", "cache_total", Scale::One),
    ("cache_faults_total", "cache_faults_total", Scale::One),
    ("commit_limit", "commit_limit", Scale::One),
    ("committed_bytes", "committed_bytes", Scale::One),
    ("modified_page_list_bytes", "modified_page_list_bytes", Scale::One),
    ("page_faults_total", "page_faults_total", Scale::One),
    ("pool_nonpaged_bytes_total", "pool_nonpaged_bytes_total", Scale::One),
    ("pool_paged_bytes", "pool_paged_bytes", Scale::One),
    ("standby_cache_core_bytes", "standby_cache_core_bytes", Scale::One),
    ("standby_cache_normal_priority_bytes", "standby_cache_normal_priority_bytes", Scale::One),
    ("standby_cache_reserve_bytes", "standby_cache_reserve_bytes", Scale::One),
    ("swap_page_reads_total", "swap_page_reads_total", Scale::One),
    ("swap_page_writes_total", "swap_page_writes_total", Scale::One),
    ("swap_pages_read_total", "swap_pages_read_total", Scale::One),
    ("swap_pages_written_total", "swap_pages_written_total", Scale::One),
];

const OS: &[Rename] = &[
    ("paging_free_bytes", "paging_free_bytes", Scale::One),
    ("paging_limit_bytes", "paging_limit_bytes", Scale::One),
    ("physical_memory_free_bytes", "physical_memory_free_bytes", Scale::One),
    ("processes", "processes", Scale::One),
    ("processes_limit", "processes_limit", Scale::One),
    ("users", "users", Scale::One),
    ("visible_memory_bytes", "visible_memory_bytes", Scale::One),
];

const TCP: &[Rename] = &[
    ("connection_failures_total", "conns_failures", Scale::One),
    ("connections_active_total", "conns_active", Scale::One),
    ("connections_established", "conns_established", Scale::One),
    ("connections_passive_total", "conns_passive", Scale::One),
    ("connections_reset_total", "conns_resets", Scale::One),
    ("segments_received_total", "segments_received", Scale::One),
    ("segments_retransmitted_total", "segments_retransmitted", Scale::One),
    ("segments_sent_total", "segments_sent", Scale::One),
];

const PROCESS: &[Rename] = &[
    ("cpu_time_total", "cpu_time", Scale::Milli),
    ("handles", "handles", Scale::One),
    ("io_bytes_total", "io_bytes", Scale::One),
    ("io_operations_total", "io_operations", Scale::One),
    ("page_faults_total", "page_faults", Scale::One),
    ("page_file_bytes", "page_file_bytes", Scale::One),
    ("threads", "threads", Scale::One),
    ("working_set_private_bytes", "working_set_private_bytes", Scale::One),
];

const IIS: &[Rename] = &[
    ("current_anonymous_users", "current_anonymous_users", Scale::One),
    ("current_non_anonymous_users", "current_non_anonymous_users", Scale::One),
    ("current_connections", "current_connections", Scale::One),
    ("connection_attempts_all_instances_total", "connection_attempts_all_instances_total", Scale::One),
    ("received_bytes_total", "received_bytes_total", Scale::One),
    ("sent_bytes_total", "sent_bytes_total", Scale::One),
    ("requests_total", "requests_total", Scale::One),
    ("files_received_total", "files_received_total", Scale::One),
    ("files_sent_total", "files_sent_total", Scale::One),
    ("logon_attempts_total", "logon_attempts_total", Scale::One),
    ("locked_errors_total", "locked_errors_total", Scale::One),
    ("not_found_errors_total", "not_found_errors_total", Scale::One),
    ("isapi_extension_requests_total", "isapi_extension_requests_total", Scale::One),
    ("current_isapi_extension_requests", "current_isapi_extension_requests", Scale::One),
    ("service_uptime", "service_uptime", Scale::One),
];

const AD: &[Rename] = &[
    ("binds_total", "binds_total", Scale::One),
    ("directory_services_threads", "directory_service_threads", Scale::One),
    ("ldap_last_bind_time_seconds", "ldap_last_bind_time_seconds", Scale::One),
    ("ldap_searches_total", "ldap_searches_total", Scale::One),
    ("replication_inbound_objects_filtered_total", "replication_inbound_objects_filtered_total", Scale::One),
    (
        "replication_inbound_properties_filtered_total",
        "replication_inbound_properties_filtered_total",
        Scale::One,
    ),
    (
        "replication_inbound_properties_updated_total",
        "replication_inbound_properties_updated_total",
        Scale::One,
    ),
    ("replication_inbound_sync_objects_remaining", "replication_inbound_sync_objects_remaining", Scale::One),
    ("replication_pending_synchronizations", "replication_pending_synchronizations", Scale::One),
    ("replication_sync_requests_total", "replication_sync_requests_total", Scale::One),
];

/// Replication traffic, split by the `direction` label.
const AD_REPLICATION_DATA: &[&str] = &[
    "replication_data_intersite_bytes_total",
    "replication_data_intrasite_bytes_total",
];

const ADFS: &[Rename] = &[
    ("ad_login_connection_failures_total", "ad_login_connection_failures_total", Scale::One),
    ("certificate_authentications_total", "certificate_authentications_total", Scale::One),
    ("db_artifact_failure_total", "db_artifact_failure_total", Scale::One),
    ("db_artifact_query_time_seconds_total", "db_artifact_query_time_seconds_total", Scale::Milli),
    ("db_config_failure_total", "db_config_failure_total", Scale::One),
    ("db_config_query_time_seconds_total", "db_config_query_time_seconds_total", Scale::Milli),
    ("device_authentications_total", "device_authentications_total", Scale::One),
    (
        "external_authentications_failure_total",
        "external_authentications_failure_total",
        Scale::One,
    ),
    (
        "external_authentications_success_total",
        "external_authentications_success_total",
        Scale::One,
    ),
    ("extranet_account_lockouts_total", "extranet_account_lockouts_total", Scale::One),
    ("federated_authentications_total", "federated_authentications_total", Scale::One),
    ("federation_metadata_requests_total", "federation_metadata_requests_total", Scale::One),
    ("oauth_authorization_requests_total", "oauth_authorization_requests_total", Scale::One),
    (
        "oauth_client_authentication_failure_total",
        "oauth_client_authentication_failure_total",
        Scale::One,
    ),
    (
        "oauth_client_authentication_success_total",
        "oauth_client_authentication_success_total",
        Scale::One,
    ),
    (
        "oauth_client_credentials_failure_total",
        "oauth_client_credentials_failure_total",
        Scale::One,
    ),
    (
        "oauth_client_credentials_success_total",
        "oauth_client_credentials_success_total",
        Scale::One,
    ),
    (
        "oauth_client_privkey_jtw_authentication_failure_total",
        "oauth_client_privkey_jtw_authentication_failure_total",
        Scale::One,
    ),
    (
        "oauth_client_privkey_jwt_authentications_success_total",
        "oauth_client_privkey_jwt_authentications_success_total",
        Scale::One,
    ),
    (
        "oauth_client_secret_basic_authentications_failure_total",
        "oauth_client_secret_basic_authentications_failure_total",
        Scale::One,
    ),
    (
        "oauth_client_secret_basic_authentications_success_total",
        "oauth_client_secret_basic_authentications_success_total",
        Scale::One,
    ),
    (
        "oauth_client_secret_post_authentications_failure_total",
        "oauth_client_secret_post_authentications_failure_total",
        Scale::One,
    ),
    (
        "oauth_client_secret_post_authentications_success_total",
        "oauth_client_secret_post_authentications_success_total",
        Scale::One,
    ),
    (
        "oauth_client_windows_authentications_failure_total",
        "oauth_client_windows_authentications_failure_total",
        Scale::One,
    ),
    (
        "oauth_client_windows_authentications_success_total",
        "oauth_client_windows_authentications_success_total",
        Scale::One,
    ),
    (
        "oauth_logon_certificate_requests_failure_total",
        "oauth_logon_certificate_requests_failure_total",
        Scale::One,
    ),
    (
        "oauth_logon_certificate_token_requests_success_total",
        "oauth_logon_certificate_token_requests_success_total",
        Scale::One,
    ),
    (
        "oauth_password_grant_requests_failure_total",
        "oauth_password_grant_requests_failure_total",
        Scale::One,
    ),
    (
        "oauth_password_grant_requests_success_total",
        "oauth_password_grant_requests_success_total",
        Scale::One,
    ),
    ("oauth_token_requests_success_total", "oauth_token_requests_success_total", Scale::One),
    ("passive_requests_total", "passive_requests_total", Scale::One),
    ("passport_authentications_total", "passport_authentications_total", Scale::One),
    ("password_change_failed_total", "password_change_failed_total", Scale::One),
    ("password_change_succeeded_total", "password_change_succeeded_total", Scale::One),
    ("samlp_token_requests_success_total", "samlp_token_requests_success_total", Scale::One),
    ("sso_authentications_failure_total", "sso_authentications_failure_total", Scale::One),
    ("sso_authentications_success_total", "sso_authentications_success_total", Scale::One),
    ("token_requests_total", "token_requests_total", Scale::One),
    (
        "userpassword_authentications_failure_total",
        "userpassword_authentications_failure_total",
        Scale::One,
    ),
    (
        "userpassword_authentications_success_total",
        "userpassword_authentications_success_total",
        Scale::One,
    ),
    (
        "windows_integrated_authentications_total",
        "windows_integrated_authentications_total",
        Scale::One,
    ),
    ("wsfed_token_requests_success_total", "wsfed_token_requests_success_total", Scale::One),
    ("wstrust_token_requests_success_total", "wstrust_token_requests_success_total", Scale::One),
];

const ADCS: &[Rename] = &[
    ("requests_total", "requests_total", Scale::One),
    ("failed_requests_total", "failed_requests_total", Scale::One),
    ("issued_requests_total", "issued_requests_total", Scale::One),
    ("pending_requests_total", "pending_requests_total", Scale::One),
    ("retrievals_total", "retrievals_total", Scale::One),
    ("challenge_responses_total", "challenge_responses_total", Scale::One),
    ("signed_certificate_timestamp_lists_total", "signed_certificate_timestamp_lists_total", Scale::One),
    ("request_processing_time_seconds", "request_processing_time_seconds", Scale::Milli),
    ("retrievals_processing_time_seconds", "retrievals_processing_time_seconds", Scale::Milli),
    (
        "request_cryptographic_signing_time_seconds",
        "request_cryptographic_signing_time_seconds",
        Scale::Milli,
    ),
    (
        "request_policy_module_processing_time_seconds",
        "request_policy_module_processing_time_seconds",
        Scale::Milli,
    ),
    (
        "challenge_response_processing_time_seconds",
        "challenge_response_processing_time_seconds",
        Scale::Milli,
    ),
    (
        "signed_certificate_timestamp_list_processing_time_seconds",
        "signed_certificate_timestamp_list_processing_time_seconds",
        Scale::Milli,
    ),
];

const MSSQL_INSTANCE: &[Rename] = &[
    ("accessmethods_page_splits", "accessmethods_page_splits", Scale::One),
    ("bufman_buffer_cache_hits", "bufman_buffer_cache_hits", Scale::One),
    ("bufman_checkpoint_pages", "bufman_checkpoint_pages", Scale::One),
    ("bufman_page_life_expectancy_seconds", "bufman_page_life_expectancy_seconds", Scale::One),
    ("bufman_page_reads", "bufman_page_reads", Scale::One),
    ("bufman_page_writes", "bufman_page_writes", Scale::One),
    ("cache_hit_ratio", "cache_hit_ratio", Scale::Percent),
    ("genstats_blocked_processes", "genstats_blocked_processes", Scale::One),
    ("genstats_user_connections", "genstats_user_connections", Scale::One),
    ("memmgr_pending_memory_grants", "memmgr_pending_memory_grants", Scale::One),
    ("memmgr_total_server_memory_bytes", "memmgr_total_server_memory_bytes", Scale::One),
    ("sqlstats_auto_parameterization_attempts", "sqlstats_auto_parameterization_attempts", Scale::One),
    (
        "sqlstats_safe_auto_parameterization_attempts",
        "sqlstats_safe_auto_parameterization_attempts",
        Scale::One,
    ),
    ("sqlstats_sql_compilations", "sqlstats_sql_compilations", Scale::One),
    ("sqlstats_sql_recompilations", "sqlstats_sql_recompilations", Scale::One),
];

const MSSQL_DATABASE: &[Rename] = &[
    ("databases_active_transactions", "active_transactions", Scale::One),
    ("databases_backup_restore_operations", "backup_restore_operations", Scale::One),
    ("databases_data_files_size_bytes", "data_files_size_bytes", Scale::One),
    ("databases_log_flushed_bytes", "log_flushed_bytes", Scale::One),
    ("databases_log_flushes", "log_flushes", Scale::One),
    ("databases_transactions", "transactions", Scale::One),
    ("databases_write_transactions", "write_transactions", Scale::One),
];

const CPU_MODES: &[&str] = &["dpc", "idle", "interrupt", "privileged", "user"];

const SERVICE_STATES: &[&str] = &[
    "running",
    "stopped",
    "start_pending",
    "stop_pending",
    "continue_pending",
    "pause_pending",
    "paused",
    "unknown",
];

const SERVICE_STATUSES: &[&str] = &[
    "ok",
    "error",
    "unknown",
    "degraded",
    "pred_fail",
    "starting",
    "stopping",
    "service",
    "stressed",
    "nonrecover",
    "no_contact",
    "lost_comm",
];

/// Inputs of derived metrics, gathered while walking the samples.
#[derive(Debug, Default)]
struct Derived {
    cs_physical_memory: Option<i64>,
    boot_time: Option<i64>,
    volumes: BTreeMap<String, (Option<i64>, Option<i64>)>,
}

/// Turns one scrape into metrics and seen entities.
///
/// `now` is the current Unix time in seconds, used for the uptime derived from
/// the exporter's boot timestamp.
pub fn normalize(samples: &[Sample], now: i64) -> Normalized {
    let mut n = Normalized::new();
    let mut derived = Derived::default();

    for sample in samples {
        if !sample.value.is_finite() {
            continue;
        }
        if let Some(suffix) = sample.name.strip_prefix("windows_exporter_collector_") {
            collect_collector_status(&mut n, suffix, sample);
            continue;
        }
        if sample.name == "windows_cs_physical_memory_bytes" {
            derived.cs_physical_memory = Some(sample.value as i64);
            continue;
        }
        let Some((family, suffix)) = Family::route(&sample.name) else {
            continue;
        };

        let recognized = match family {
            Family::Cpu => collect_cpu(&mut n, suffix, sample),
            Family::LogicalDisk => collect_logical_disk(&mut n, &mut derived, suffix, sample),
            Family::Net => collect_labeled(&mut n, EntityClass::Nic, "nic", "net_nic", NET, suffix, sample),
            Family::Memory => collect_plain(&mut n, "memory", MEMORY, suffix, sample),
            Family::Os => collect_plain(&mut n, "os", OS, suffix, sample),
            Family::System => collect_system(&mut n, &mut derived, suffix, sample),
            Family::Tcp => collect_tcp(&mut n, suffix, sample),
            Family::Logon => collect_logon(&mut n, suffix, sample),
            Family::ThermalZone => collect_thermal_zone(&mut n, suffix, sample),
            Family::Process => collect_process(&mut n, suffix, sample),
            Family::Service => collect_service(&mut n, suffix, sample),
            Family::Iis => {
                collect_labeled(&mut n, EntityClass::Website, "site", "iis_website", IIS, suffix, sample)
            }
            Family::Adcs => collect_labeled(
                &mut n,
                EntityClass::CertTemplate,
                "cert_template",
                "adcs_cert_template",
                ADCS,
                suffix,
                sample,
            ),
            Family::Ad => collect_ad(&mut n, suffix, sample),
            Family::Adfs => collect_plain(&mut n, "adfs", ADFS, suffix, sample),
            Family::Mssql => collect_mssql(&mut n, suffix, sample),
        };

        if recognized {
            n.see(EntityClass::Family, EntityId::new(family.name()));
        }
    }

    derive(&mut n, derived, now);
    n
}

fn collect_collector_status(n: &mut Normalized, suffix: &str, sample: &Sample) {
    let Some(name) = sample.label("collector").map(sanitize_id) else {
        return;
    };
    match suffix {
        "success" => {
            let ok = sample.value as i64;
            n.set(format!("collector_{name}_status_success"), ok);
            n.set(format!("collector_{name}_status_fail"), 1 - ok);
        }
        "duration_seconds" => {
            n.set(format!("collector_{name}_duration"), Scale::Milli.apply(sample.value));
        }
        _ => return,
    }
    n.see(EntityClass::Collector, EntityId::new(name));
}

fn collect_cpu(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    let Some(core) = sample.label("core").map(sanitize_id) else {
        return false;
    };
    match suffix {
        "time_total" => {
            let Some(mode) = sample.label("mode").filter(|m| CPU_MODES.contains(m)) else {
                return false;
            };
            let v = Scale::Milli.apply(sample.value);
            n.set(format!("cpu_core_{core}_{mode}_time"), v);
            // Totals are sums of the truncated per-core values.
            n.add(format!("cpu_{mode}_time"), v);
        }
        "cstate_seconds_total" => {
            let Some(state) = sample.label("state") else {
                return false;
            };
            n.set(
                format!("cpu_core_{core}_cstate_{}", sanitize_id(state)),
                Scale::Milli.apply(sample.value),
            );
        }
        "dpcs_total" => n.set(format!("cpu_core_{core}_dpcs"), sample.value as i64),
        "interrupts_total" => n.set(format!("cpu_core_{core}_interrupts"), sample.value as i64),
        _ => return false,
    }
    n.see(EntityClass::Core, EntityId::new(core));
    true
}

fn collect_logical_disk(n: &mut Normalized, derived: &mut Derived, suffix: &str, sample: &Sample) -> bool {
    let Some(volume) = sample.label("volume") else {
        return false;
    };
    if volume.starts_with("HarddiskVolume") || volume == "_Total" {
        return false;
    }
    let Some((to, scale)) = rename(LOGICAL_DISK, suffix) else {
        return false;
    };
    let volume = sanitize_id(volume);
    let v = scale.apply(sample.value);
    n.set(format!("logical_disk_{volume}_{to}"), v);

    let entry = derived.volumes.entry(volume.clone()).or_default();
    match to {
        "free_space" => entry.0 = Some(v),
        "total_space" => entry.1 = Some(v),
        _ => {}
    }
    n.see(EntityClass::Volume, EntityId::new(volume));
    true
}

/// Per-entity family whose entity comes from a single label.
fn collect_labeled(
    n: &mut Normalized,
    class: EntityClass,
    label: &str,
    prefix: &str,
    table: &'static [Rename],
    suffix: &str,
    sample: &Sample,
) -> bool {
    let Some(name) = sample.label(label).map(sanitize_id) else {
        return false;
    };
    let Some((to, scale)) = rename(table, suffix) else {
        return false;
    };
    // Series that differ only in other labels (e.g. IIS request method) are summed.
    n.add(format!("{prefix}_{name}_{to}"), scale.apply(sample.value));
    n.see(class, EntityId::new(name));
    true
}

/// Family without entities.
fn collect_plain(
    n: &mut Normalized,
    prefix: &str,
    table: &'static [Rename],
    suffix: &str,
    sample: &Sample,
) -> bool {
    let Some((to, scale)) = rename(table, suffix) else {
        return false;
    };
    n.set(format!("{prefix}_{to}"), scale.apply(sample.value));
    true
}

fn collect_system(n: &mut Normalized, derived: &mut Derived, suffix: &str, sample: &Sample) -> bool {
    match suffix {
        "threads" => n.set("system_threads", sample.value as i64),
        "system_up_time" => derived.boot_time = Some(sample.value as i64),
        _ => return false,
    }
    true
}

fn collect_tcp(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    let Some(af) = sample.label("af").filter(|af| matches!(*af, "ipv4" | "ipv6")) else {
        return false;
    };
    let Some((to, scale)) = rename(TCP, suffix) else {
        return false;
    };
    n.set(format!("tcp_{af}_{to}"), scale.apply(sample.value));
    true
}

fn collect_logon(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    if suffix != "logon_type" {
        return false;
    }
    let Some(status) = sample.label("status") else {
        return false;
    };
    n.set(
        format!("logon_type_{}_sessions", sanitize_id(&status.to_lowercase())),
        sample.value as i64,
    );
    true
}

fn collect_thermal_zone(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    if suffix != "temperature_celsius" {
        return false;
    }
    let Some(zone) = sample.label("name").map(sanitize_id) else {
        return false;
    };
    n.set(format!("thermalzone_{zone}_temperature"), sample.value as i64);
    n.see(EntityClass::ThermalZone, EntityId::new(zone));
    true
}

fn collect_process(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    let Some(name) = sample.label("process") else {
        return false;
    };
    if name == "Idle" || name == "_Total" {
        return false;
    }
    let Some((to, scale)) = rename(PROCESS, suffix) else {
        return false;
    };
    let name = sanitize_id(name);
    // Summed across PIDs and modes of the same process name.
    n.add(format!("process_{name}_{to}"), scale.apply(sample.value));
    n.see(EntityClass::Process, EntityId::new(name));
    true
}

fn collect_service(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    let Some(name) = sample.label("name").map(sanitize_id) else {
        return false;
    };
    let (kind, value, known) = match suffix {
        "state" => ("state", sample.label("state"), SERVICE_STATES),
        "status" => ("status", sample.label("status"), SERVICE_STATUSES),
        _ => return false,
    };
    let Some(value) = value.map(|v| sanitize_id(&v.to_lowercase())) else {
        return false;
    };
    if !known.contains(&value.as_str()) {
        return false;
    }
    n.set(format!("service_{name}_{kind}_{value}"), sample.value as i64);
    n.see(EntityClass::Service, EntityId::new(name));
    true
}

fn collect_ad(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    if AD_REPLICATION_DATA.contains(&suffix) {
        let Some(direction) = sample
            .label("direction")
            .filter(|d| matches!(*d, "inbound" | "outbound"))
        else {
            return false;
        };
        n.add(format!("ad_{suffix}_{direction}"), sample.value as i64);
        return true;
    }
    let Some((to, scale)) = rename(AD, suffix) else {
        return false;
    };
    // Binds are reported per bind method.
    n.add(format!("ad_{to}"), scale.apply(sample.value));
    true
}

fn collect_mssql(n: &mut Normalized, suffix: &str, sample: &Sample) -> bool {
    let Some(instance) = sample.label("mssql_instance").map(sanitize_id) else {
        return false;
    };

    if let Some((to, scale)) = rename(MSSQL_DATABASE, suffix) {
        let Some(database) = sample.label("database").map(sanitize_id) else {
            return false;
        };
        n.set(
            format!("mssql_db_{database}_instance_{instance}_{to}"),
            scale.apply(sample.value),
        );
        n.see(EntityClass::MssqlInstance, EntityId::new(instance.clone()));
        n.see(EntityClass::MssqlDatabase, EntityId::pair(instance, database));
        return true;
    }

    if suffix == "locks_lock_wait_seconds" {
        let Some(resource) = sample.label("resource").map(sanitize_id) else {
            return false;
        };
        n.set(
            format!("mssql_instance_{instance}_resource_{resource}_locks_lock_wait_seconds"),
            Scale::Milli.apply(sample.value),
        );
    } else if let Some((to, scale)) = rename(MSSQL_INSTANCE, suffix) {
        n.set(format!("mssql_instance_{instance}_{to}"), scale.apply(sample.value));
    } else {
        return false;
    }
    n.see(EntityClass::MssqlInstance, EntityId::new(instance));
    true
}

/// Metrics computed from more than one sample.
fn derive(n: &mut Normalized, derived: Derived, now: i64) {
    let mx = &n.metrics;
    let mut out: Vec<(String, i64)> = Vec::new();

    if let (Some(physical), Some(available)) = (derived.cs_physical_memory, mx.get("memory_available_bytes")) {
        out.push(("memory_used_bytes".into(), physical - available));
    }
    if let (Some(limit), Some(committed)) = (mx.get("memory_commit_limit"), mx.get("memory_committed_bytes")) {
        out.push(("memory_not_committed_bytes".into(), limit - committed));
    }
    let standby: Vec<i64> = [
        "memory_standby_cache_core_bytes",
        "memory_standby_cache_normal_priority_bytes",
        "memory_standby_cache_reserve_bytes",
    ]
    .iter()
    .filter_map(|k| mx.get(*k).copied())
    .collect();
    if standby.len() == 3 {
        out.push(("memory_standby_cache_total".into(), standby.iter().sum()));
    }
    if let (Some(limit), Some(free)) = (mx.get("os_paging_limit_bytes"), mx.get("os_paging_free_bytes")) {
        out.push(("os_paging_used_bytes".into(), limit - free));
    }
    if let (Some(visible), Some(free)) = (mx.get("os_visible_memory_bytes"), mx.get("os_physical_memory_free_bytes")) {
        out.push(("os_visible_memory_used_bytes".into(), visible - free));
    }
    if let Some(boot) = derived.boot_time {
        out.push(("system_up_time".into(), now - boot));
    }
    for (volume, (free, total)) in derived.volumes {
        if let (Some(free), Some(total)) = (free, total) {
            out.push((format!("logical_disk_{volume}_used_space"), total - free));
        }
    }

    for (key, value) in out {
        n.set(key, value);
    }
}
