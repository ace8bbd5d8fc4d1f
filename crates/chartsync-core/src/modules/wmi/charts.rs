//! Chart catalog of the wmi module.

use crate::charts::{ChartChange, ChartTemplate, ChartType, DimTemplate, IdTemplate};
use crate::collector::{EntityCharts, EntityClass, EntityId, Snapshot, add_backed_charts, add_charts};
use crate::error::MaterializeError;

use super::collect::Family;

const PRIO_CPU: u32 = 1000;
const PRIO_MEMORY: u32 = 1100;
const PRIO_DISK: u32 = 1200;
const PRIO_NET: u32 = 1300;
const PRIO_TCP: u32 = 1400;
const PRIO_OS: u32 = 1500;
const PRIO_SYSTEM: u32 = 1600;
const PRIO_LOGON: u32 = 1700;
const PRIO_THERMAL: u32 = 1800;
const PRIO_PROCESSES: u32 = 1900;
const PRIO_SERVICES: u32 = 2000;
const PRIO_IIS: u32 = 2100;
const PRIO_AD: u32 = 2150;
const PRIO_ADCS: u32 = 2200;
const PRIO_ADFS: u32 = 2250;
const PRIO_MSSQL: u32 = 2300;
const PRIO_COLLECTORS: u32 = 2900;

/// Id with one placeholder, the entity name.
const fn id(pattern: &'static str) -> IdTemplate {
    IdTemplate::new(pattern, 1)
}

/// Id with `{0}` = instance, `{1}` = database.
const fn db(pattern: &'static str) -> IdTemplate {
    IdTemplate::new(pattern, 2)
}

const fn fixed(pattern: &'static str) -> IdTemplate {
    IdTemplate::fixed(pattern)
}

#[allow(clippy::too_many_arguments)]
const fn chart(
    id: IdTemplate,
    title: &'static str,
    units: &'static str,
    family: &'static str,
    context: &'static str,
    chart_type: ChartType,
    priority: u32,
    dims: &'static [DimTemplate],
) -> ChartTemplate {
    ChartTemplate {
        id,
        title,
        units,
        family,
        context,
        chart_type,
        priority,
        dims,
        vars: &[],
    }
}

// CPU

const CPU_CHARTS: &[ChartTemplate] = &[chart(
    fixed("cpu_utilization_total"),
    "Total CPU Utilization (all cores)",
    "percentage",
    "cpu",
    "wmi.cpu_utilization_total",
    ChartType::Stacked,
    PRIO_CPU,
    &[
        DimTemplate::percent_of_incremental_row(fixed("cpu_dpc_time"), "dpc"),
        DimTemplate::percent_of_incremental_row(fixed("cpu_user_time"), "user"),
        DimTemplate::percent_of_incremental_row(fixed("cpu_privileged_time"), "privileged"),
        DimTemplate::percent_of_incremental_row(fixed("cpu_interrupt_time"), "interrupt"),
        DimTemplate::percent_of_incremental_row(fixed("cpu_idle_time"), "idle").hidden(),
    ],
)];

const CORE_CHARTS: &[ChartTemplate] = &[
    chart(
        id("core_{0}_cpu_utilization"),
        "Core CPU Utilization",
        "percentage",
        "cpu",
        "wmi.cpu_core_utilization",
        ChartType::Stacked,
        PRIO_CPU + 1,
        &[
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_dpc_time"), "dpc"),
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_user_time"), "user"),
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_privileged_time"), "privileged"),
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_interrupt_time"), "interrupt"),
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_idle_time"), "idle").hidden(),
        ],
    ),
    chart(
        id("core_{0}_cpu_interrupts"),
        "Received and Serviced Hardware Interrupts",
        "interrupts/s",
        "cpu",
        "wmi.cpu_core_interrupts",
        ChartType::Line,
        PRIO_CPU + 2,
        &[DimTemplate::incremental(id("cpu_core_{0}_interrupts"), "interrupts")],
    ),
    chart(
        id("core_{0}_cpu_dpcs"),
        "Received and Serviced Deferred Procedure Calls (DPC)",
        "dpc/s",
        "cpu",
        "wmi.cpu_core_dpcs",
        ChartType::Line,
        PRIO_CPU + 3,
        &[DimTemplate::incremental(id("cpu_core_{0}_dpcs"), "dpcs")],
    ),
    chart(
        id("core_{0}_cpu_cstate"),
        "Core Time Spent in Low-Power Idle State",
        "percentage",
        "cpu",
        "wmi.cpu_core_cstate",
        ChartType::Stacked,
        PRIO_CPU + 4,
        &[
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_cstate_c1"), "c1"),
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_cstate_c2"), "c2"),
            DimTemplate::percent_of_incremental_row(id("cpu_core_{0}_cstate_c3"), "c3"),
        ],
    ),
];

// Memory

const MEMORY_CHARTS: &[ChartTemplate] = &[
    chart(
        fixed("memory_utilization"),
        "Memory Utilization",
        "KiB",
        "memory",
        "wmi.memory_utilization",
        ChartType::Stacked,
        PRIO_MEMORY,
        &[
            DimTemplate::absolute(fixed("memory_available_bytes"), "available").with_div(1024),
            DimTemplate::absolute(fixed("memory_used_bytes"), "used").with_div(1024),
        ],
    ),
    chart(
        fixed("memory_page_faults"),
        "Memory Page Faults",
        "events/s",
        "memory",
        "wmi.memory_page_faults",
        ChartType::Line,
        PRIO_MEMORY + 1,
        &[DimTemplate::incremental(fixed("memory_page_faults_total"), "page faults")],
    ),
    ChartTemplate {
        vars: &[fixed("memory_commit_limit")],
        ..chart(
            fixed("memory_swap_utilization"),
            "Swap Utilization",
            "KiB",
            "memory",
            "wmi.memory_swap_utilization",
            ChartType::Stacked,
            PRIO_MEMORY + 2,
            &[
                DimTemplate::absolute(fixed("memory_not_committed_bytes"), "available").with_div(1024),
                DimTemplate::absolute(fixed("memory_committed_bytes"), "used").with_div(1024),
            ],
        )
    },
    chart(
        fixed("memory_swap_operations"),
        "Swap Operations",
        "operations/s",
        "memory",
        "wmi.memory_swap_operations",
        ChartType::Area,
        PRIO_MEMORY + 3,
        &[
            DimTemplate::incremental(fixed("memory_swap_page_reads_total"), "read"),
            DimTemplate::incremental(fixed("memory_swap_page_writes_total"), "write").with_mul(-1),
        ],
    ),
    chart(
        fixed("memory_swap_pages"),
        "Swap Pages",
        "pages/s",
        "memory",
        "wmi.memory_swap_pages",
        ChartType::Line,
        PRIO_MEMORY + 4,
        &[
            DimTemplate::incremental(fixed("memory_swap_pages_read_total"), "read"),
            DimTemplate::incremental(fixed("memory_swap_pages_written_total"), "written").with_mul(-1),
        ],
    ),
    chart(
        fixed("memory_cached"),
        "Cached",
        "KiB",
        "memory",
        "wmi.memory_cached",
        ChartType::Area,
        PRIO_MEMORY + 5,
        &[DimTemplate::absolute(fixed("memory_cache_total"), "cached").with_div(1024)],
    ),
    chart(
        fixed("memory_cache_faults"),
        "Cache Faults",
        "events/s",
        "memory",
        "wmi.memory_cache_faults",
        ChartType::Line,
        PRIO_MEMORY + 6,
        &[DimTemplate::incremental(fixed("memory_cache_faults_total"), "cache faults")],
    ),
    chart(
        fixed("memory_system_pool"),
        "System Memory Pool",
        "KiB",
        "memory",
        "wmi.memory_system_pool",
        ChartType::Stacked,
        PRIO_MEMORY + 7,
        &[
            DimTemplate::absolute(fixed("memory_pool_paged_bytes"), "paged").with_div(1024),
            DimTemplate::absolute(fixed("memory_pool_nonpaged_bytes_total"), "non-paged").with_div(1024),
        ],
    ),
    ChartTemplate {
        vars: &[fixed("memory_standby_cache_total")],
        ..chart(
            fixed("memory_standby_cache"),
            "Standby Cache",
            "KiB",
            "memory",
            "wmi.memory_standby_cache",
            ChartType::Stacked,
            PRIO_MEMORY + 8,
            &[
                DimTemplate::absolute(fixed("memory_standby_cache_core_bytes"), "core").with_div(1024),
                DimTemplate::absolute(fixed("memory_standby_cache_normal_priority_bytes"), "normal").with_div(1024),
                DimTemplate::absolute(fixed("memory_standby_cache_reserve_bytes"), "reserve").with_div(1024),
            ],
        )
    },
    chart(
        fixed("memory_modified_page_list"),
        "Modified Page List",
        "KiB",
        "memory",
        "wmi.memory_modified_page_list",
        ChartType::Line,
        PRIO_MEMORY + 9,
        &[DimTemplate::absolute(fixed("memory_modified_page_list_bytes"), "modified").with_div(1024)],
    ),
];

// Logical disks

const VOLUME_CHARTS: &[ChartTemplate] = &[
    ChartTemplate {
        vars: &[id("logical_disk_{0}_total_space")],
        ..chart(
            id("logical_disk_{0}_usage"),
            "Space Usage",
            "KiB",
            "disk",
            "wmi.logical_disk_usage",
            ChartType::Stacked,
            PRIO_DISK,
            &[
                DimTemplate::absolute(id("logical_disk_{0}_free_space"), "free").with_div(1024),
                DimTemplate::absolute(id("logical_disk_{0}_used_space"), "used").with_div(1024),
            ],
        )
    },
    chart(
        id("logical_disk_{0}_bandwidth"),
        "Bandwidth",
        "KiB/s",
        "disk",
        "wmi.logical_disk_bandwidth",
        ChartType::Area,
        PRIO_DISK + 1,
        &[
            DimTemplate::incremental(id("logical_disk_{0}_read_bytes_total"), "read").with_div(1024),
            DimTemplate::incremental(id("logical_disk_{0}_write_bytes_total"), "write")
                .with_mul(-1)
                .with_div(1024),
        ],
    ),
    chart(
        id("logical_disk_{0}_operations"),
        "Operations",
        "operations/s",
        "disk",
        "wmi.logical_disk_operations",
        ChartType::Line,
        PRIO_DISK + 2,
        &[
            DimTemplate::incremental(id("logical_disk_{0}_reads_total"), "reads"),
            DimTemplate::incremental(id("logical_disk_{0}_writes_total"), "writes").with_mul(-1),
        ],
    ),
    chart(
        id("logical_disk_{0}_latency"),
        "Average Read/Write Latency",
        "milliseconds",
        "disk",
        "wmi.logical_disk_latency",
        ChartType::Line,
        PRIO_DISK + 3,
        &[
            DimTemplate::incremental(id("logical_disk_{0}_read_latency"), "read"),
            DimTemplate::incremental(id("logical_disk_{0}_write_latency"), "write"),
        ],
    ),
];

// Network interfaces

const NIC_CHARTS: &[ChartTemplate] = &[
    chart(
        id("nic_{0}_bandwidth"),
        "Bandwidth",
        "kilobits/s",
        "network",
        "wmi.net_bandwidth",
        ChartType::Area,
        PRIO_NET,
        &[
            DimTemplate::incremental(id("net_nic_{0}_bytes_received"), "received")
                .with_mul(8)
                .with_div(1000),
            DimTemplate::incremental(id("net_nic_{0}_bytes_sent"), "sent")
                .with_mul(-8)
                .with_div(1000),
        ],
    ),
    chart(
        id("nic_{0}_packets"),
        "Packets",
        "packets/s",
        "network",
        "wmi.net_packets",
        ChartType::Line,
        PRIO_NET + 1,
        &[
            DimTemplate::incremental(id("net_nic_{0}_packets_received_total"), "received"),
            DimTemplate::incremental(id("net_nic_{0}_packets_sent_total"), "sent").with_mul(-1),
        ],
    ),
    chart(
        id("nic_{0}_errors"),
        "Errors",
        "errors/s",
        "network",
        "wmi.net_errors",
        ChartType::Line,
        PRIO_NET + 2,
        &[
            DimTemplate::incremental(id("net_nic_{0}_packets_received_errors"), "inbound"),
            DimTemplate::incremental(id("net_nic_{0}_packets_outbound_errors"), "outbound").with_mul(-1),
        ],
    ),
    chart(
        id("nic_{0}_discarded"),
        "Discards",
        "discards/s",
        "network",
        "wmi.net_discarded",
        ChartType::Line,
        PRIO_NET + 3,
        &[
            DimTemplate::incremental(id("net_nic_{0}_packets_received_discarded"), "inbound"),
            DimTemplate::incremental(id("net_nic_{0}_packets_outbound_discarded"), "outbound").with_mul(-1),
        ],
    ),
];

// TCP

const TCP_CHARTS: &[ChartTemplate] = &[
    chart(
        fixed("tcp_conns_established"),
        "TCP established connections",
        "connections",
        "tcp",
        "wmi.tcp_conns_established",
        ChartType::Line,
        PRIO_TCP,
        &[
            DimTemplate::absolute(fixed("tcp_ipv4_conns_established"), "ipv4"),
            DimTemplate::absolute(fixed("tcp_ipv6_conns_established"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_conns_active"),
        "TCP active connections",
        "connections/s",
        "tcp",
        "wmi.tcp_conns_active",
        ChartType::Line,
        PRIO_TCP + 1,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_conns_active"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_conns_active"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_conns_passive"),
        "TCP passive connections",
        "connections/s",
        "tcp",
        "wmi.tcp_conns_passive",
        ChartType::Line,
        PRIO_TCP + 2,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_conns_passive"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_conns_passive"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_conns_failures"),
        "TCP connection failures",
        "failures/s",
        "tcp",
        "wmi.tcp_conns_failures",
        ChartType::Line,
        PRIO_TCP + 3,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_conns_failures"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_conns_failures"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_conns_resets"),
        "TCP connections resets",
        "resets/s",
        "tcp",
        "wmi.tcp_conns_resets",
        ChartType::Line,
        PRIO_TCP + 4,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_conns_resets"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_conns_resets"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_segments_received"),
        "Number of TCP segments received",
        "segments/s",
        "tcp",
        "wmi.tcp_segments_received",
        ChartType::Line,
        PRIO_TCP + 5,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_segments_received"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_segments_received"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_segments_sent"),
        "Number of TCP segments sent",
        "segments/s",
        "tcp",
        "wmi.tcp_segments_sent",
        ChartType::Line,
        PRIO_TCP + 6,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_segments_sent"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_segments_sent"), "ipv6"),
        ],
    ),
    chart(
        fixed("tcp_segments_retransmitted"),
        "Number of TCP segments retransmitted",
        "segments/s",
        "tcp",
        "wmi.tcp_segments_retransmitted",
        ChartType::Line,
        PRIO_TCP + 7,
        &[
            DimTemplate::incremental(fixed("tcp_ipv4_segments_retransmitted"), "ipv4"),
            DimTemplate::incremental(fixed("tcp_ipv6_segments_retransmitted"), "ipv6"),
        ],
    ),
];

// OS

const OS_CHARTS: &[ChartTemplate] = &[
    ChartTemplate {
        vars: &[fixed("os_processes_limit")],
        ..chart(
            fixed("os_processes"),
            "Processes",
            "number",
            "os",
            "wmi.os_processes",
            ChartType::Line,
            PRIO_OS,
            &[DimTemplate::absolute(fixed("os_processes"), "processes")],
        )
    },
    chart(
        fixed("os_users"),
        "Number of Users",
        "users",
        "os",
        "wmi.os_users",
        ChartType::Line,
        PRIO_OS + 1,
        &[DimTemplate::absolute(fixed("os_users"), "users")],
    ),
    ChartTemplate {
        vars: &[fixed("os_visible_memory_bytes")],
        ..chart(
            fixed("os_visible_memory_usage"),
            "Visible Memory Usage",
            "bytes",
            "os",
            "wmi.os_visible_memory_usage",
            ChartType::Stacked,
            PRIO_OS + 2,
            &[
                DimTemplate::absolute(fixed("os_physical_memory_free_bytes"), "free"),
                DimTemplate::absolute(fixed("os_visible_memory_used_bytes"), "used"),
            ],
        )
    },
    ChartTemplate {
        vars: &[fixed("os_paging_limit_bytes")],
        ..chart(
            fixed("os_paging_files_usage"),
            "Paging Files Usage",
            "bytes",
            "os",
            "wmi.os_paging_files_usage",
            ChartType::Stacked,
            PRIO_OS + 3,
            &[
                DimTemplate::absolute(fixed("os_paging_free_bytes"), "free"),
                DimTemplate::absolute(fixed("os_paging_used_bytes"), "used"),
            ],
        )
    },
];

// System

const SYSTEM_CHARTS: &[ChartTemplate] = &[
    chart(
        fixed("system_threads"),
        "Threads",
        "number",
        "system",
        "wmi.system_threads",
        ChartType::Line,
        PRIO_SYSTEM,
        &[DimTemplate::absolute(fixed("system_threads"), "threads")],
    ),
    chart(
        fixed("system_uptime"),
        "Uptime",
        "seconds",
        "system",
        "wmi.system_uptime",
        ChartType::Line,
        PRIO_SYSTEM + 1,
        &[DimTemplate::absolute(fixed("system_up_time"), "time")],
    ),
];

// Logon

const LOGON_CHARTS: &[ChartTemplate] = &[chart(
    fixed("logon_active_sessions_by_type"),
    "Active User Logon Sessions By Type",
    "sessions",
    "logon",
    "wmi.logon_type_sessions",
    ChartType::Stacked,
    PRIO_LOGON,
    &[
        DimTemplate::absolute(fixed("logon_type_system_sessions"), "system"),
        DimTemplate::absolute(fixed("logon_type_proxy_sessions"), "proxy"),
        DimTemplate::absolute(fixed("logon_type_network_sessions"), "network"),
        DimTemplate::absolute(fixed("logon_type_interactive_sessions"), "interactive"),
        DimTemplate::absolute(fixed("logon_type_batch_sessions"), "batch"),
        DimTemplate::absolute(fixed("logon_type_service_sessions"), "service"),
        DimTemplate::absolute(fixed("logon_type_unlock_sessions"), "unlock"),
        DimTemplate::absolute(fixed("logon_type_network_clear_text_sessions"), "network_clear_text"),
        DimTemplate::absolute(fixed("logon_type_new_credentials_sessions"), "new_credentials"),
        DimTemplate::absolute(fixed("logon_type_remote_interactive_sessions"), "remote_interactive"),
        DimTemplate::absolute(fixed("logon_type_cached_interactive_sessions"), "cached_interactive"),
        DimTemplate::absolute(
            fixed("logon_type_cached_remote_interactive_sessions"),
            "cached_remote_interactive",
        ),
        DimTemplate::absolute(fixed("logon_type_cached_unlock_sessions"), "cached_unlock"),
    ],
)];

// Thermal zones

const THERMAL_ZONE_CHARTS: &[ChartTemplate] = &[chart(
    id("thermalzone_{0}_temperature"),
    "Thermal zone temperature",
    "Celsius",
    "thermalzone",
    "wmi.thermalzone_temperature",
    ChartType::Area,
    PRIO_THERMAL,
    &[DimTemplate::absolute(id("thermalzone_{0}_temperature"), "temperature")],
)];

// Processes: fixed charts without dimensions, one dimension per process name.

const PROCESSES_CHARTS: &[ChartTemplate] = &[
    chart(
        fixed("processes_cpu_time"),
        "CPU usage (100% = 1 core)",
        "percentage",
        "processes",
        "wmi.processes_cpu_time",
        ChartType::Stacked,
        PRIO_PROCESSES,
        &[],
    ),
    chart(
        fixed("processes_handles"),
        "Number of handles open",
        "handles",
        "processes",
        "wmi.processes_handles",
        ChartType::Stacked,
        PRIO_PROCESSES + 1,
        &[],
    ),
    chart(
        fixed("processes_io_bytes"),
        "Total of IO bytes (read, write, other)",
        "bytes/s",
        "processes",
        "wmi.processes_io_bytes",
        ChartType::Stacked,
        PRIO_PROCESSES + 2,
        &[],
    ),
    chart(
        fixed("processes_io_operations"),
        "Total of IO events (read, write, other)",
        "operations/s",
        "processes",
        "wmi.processes_io_operations",
        ChartType::Stacked,
        PRIO_PROCESSES + 3,
        &[],
    ),
    chart(
        fixed("processes_page_faults"),
        "Number of page faults",
        "pgfaults/s",
        "processes",
        "wmi.processes_page_faults",
        ChartType::Stacked,
        PRIO_PROCESSES + 4,
        &[],
    ),
    chart(
        fixed("processes_page_file_bytes"),
        "Bytes used in page file(s)",
        "bytes",
        "processes",
        "wmi.processes_file_bytes",
        ChartType::Stacked,
        PRIO_PROCESSES + 5,
        &[],
    ),
    chart(
        fixed("processes_threads"),
        "Active threads",
        "threads",
        "processes",
        "wmi.processes_threads",
        ChartType::Stacked,
        PRIO_PROCESSES + 6,
        &[],
    ),
    chart(
        fixed("processes_working_set_private_bytes"),
        "Memory usage (private working set)",
        "bytes",
        "processes",
        "wmi.processes_working_set_private_bytes",
        ChartType::Stacked,
        PRIO_PROCESSES + 7,
        &[],
    ),
];

/// `(fixed chart id, dimension)` pairs attached for every process name.
const PROCESS_DIMS: &[(&str, DimTemplate)] = &[
    (
        "processes_cpu_time",
        DimTemplate::incremental(id("process_{0}_cpu_time"), "process").with_div(10),
    ),
    (
        "processes_handles",
        DimTemplate::absolute(id("process_{0}_handles"), "process"),
    ),
    (
        "processes_io_bytes",
        DimTemplate::incremental(id("process_{0}_io_bytes"), "process"),
    ),
    (
        "processes_io_operations",
        DimTemplate::incremental(id("process_{0}_io_operations"), "process"),
    ),
    (
        "processes_page_faults",
        DimTemplate::incremental(id("process_{0}_page_faults"), "process"),
    ),
    (
        "processes_page_file_bytes",
        DimTemplate::absolute(id("process_{0}_page_file_bytes"), "process"),
    ),
    (
        "processes_threads",
        DimTemplate::absolute(id("process_{0}_threads"), "process"),
    ),
    (
        "processes_working_set_private_bytes",
        DimTemplate::absolute(id("process_{0}_working_set_private_bytes"), "process"),
    ),
];

// Services

const SERVICE_CHARTS: &[ChartTemplate] = &[
    chart(
        id("service_{0}_state"),
        "Service state",
        "state",
        "services",
        "wmi.service_state",
        ChartType::Line,
        PRIO_SERVICES,
        &[
            DimTemplate::absolute(id("service_{0}_state_running"), "running"),
            DimTemplate::absolute(id("service_{0}_state_stopped"), "stopped"),
            DimTemplate::absolute(id("service_{0}_state_start_pending"), "start_pending"),
            DimTemplate::absolute(id("service_{0}_state_stop_pending"), "stop_pending"),
            DimTemplate::absolute(id("service_{0}_state_continue_pending"), "continue_pending"),
            DimTemplate::absolute(id("service_{0}_state_pause_pending"), "pause_pending"),
            DimTemplate::absolute(id("service_{0}_state_paused"), "paused"),
            DimTemplate::absolute(id("service_{0}_state_unknown"), "unknown"),
        ],
    ),
    chart(
        id("service_{0}_status"),
        "Service status",
        "status",
        "services",
        "wmi.service_status",
        ChartType::Line,
        PRIO_SERVICES + 1,
        &[
            DimTemplate::absolute(id("service_{0}_status_ok"), "ok"),
            DimTemplate::absolute(id("service_{0}_status_error"), "error"),
            DimTemplate::absolute(id("service_{0}_status_unknown"), "unknown"),
            DimTemplate::absolute(id("service_{0}_status_degraded"), "degraded"),
            DimTemplate::absolute(id("service_{0}_status_pred_fail"), "pred_fail"),
            DimTemplate::absolute(id("service_{0}_status_starting"), "starting"),
            DimTemplate::absolute(id("service_{0}_status_stopping"), "stopping"),
            DimTemplate::absolute(id("service_{0}_status_service"), "service"),
            DimTemplate::absolute(id("service_{0}_status_stressed"), "stressed"),
            DimTemplate::absolute(id("service_{0}_status_nonrecover"), "nonrecover"),
            DimTemplate::absolute(id("service_{0}_status_no_contact"), "no_contact"),
            DimTemplate::absolute(id("service_{0}_status_lost_comm"), "lost_comm"),
        ],
    ),
];

// IIS

const WEBSITE_CHARTS: &[ChartTemplate] = &[
    chart(
        id("iis_website_{0}_traffic"),
        "Website traffic",
        "bytes/s",
        "iis",
        "wmi.iis_website_traffic",
        ChartType::Area,
        PRIO_IIS,
        &[
            DimTemplate::incremental(id("iis_website_{0}_received_bytes_total"), "received"),
            DimTemplate::incremental(id("iis_website_{0}_sent_bytes_total"), "sent").with_mul(-1),
        ],
    ),
    chart(
        id("iis_website_{0}_requests_rate"),
        "Website requests rate",
        "requests/s",
        "iis",
        "wmi.iis_website_requests_rate",
        ChartType::Line,
        PRIO_IIS + 1,
        &[DimTemplate::incremental(id("iis_website_{0}_requests_total"), "requests")],
    ),
    chart(
        id("iis_website_{0}_active_connections_count"),
        "Website active connections",
        "connections",
        "iis",
        "wmi.iis_website_active_connections_count",
        ChartType::Line,
        PRIO_IIS + 2,
        &[DimTemplate::absolute(id("iis_website_{0}_current_connections"), "active")],
    ),
    chart(
        id("iis_website_{0}_users_count"),
        "Website users with pending requests",
        "users",
        "iis",
        "wmi.iis_website_users_count",
        ChartType::Stacked,
        PRIO_IIS + 3,
        &[
            DimTemplate::absolute(id("iis_website_{0}_current_anonymous_users"), "anonymous"),
            DimTemplate::absolute(id("iis_website_{0}_current_non_anonymous_users"), "non_anonymous"),
        ],
    ),
    chart(
        id("iis_website_{0}_connection_attempts_rate"),
        "Website connections attempts",
        "attempts/s",
        "iis",
        "wmi.iis_website_connection_attempts_rate",
        ChartType::Line,
        PRIO_IIS + 4,
        &[DimTemplate::incremental(
            id("iis_website_{0}_connection_attempts_all_instances_total"),
            "connection",
        )],
    ),
    chart(
        id("iis_website_{0}_isapi_extension_requests_count"),
        "ISAPI extension requests",
        "requests",
        "iis",
        "wmi.iis_website_isapi_extension_requests_count",
        ChartType::Line,
        PRIO_IIS + 5,
        &[DimTemplate::absolute(id("iis_website_{0}_current_isapi_extension_requests"), "isapi")],
    ),
    chart(
        id("iis_website_{0}_isapi_extension_requests_rate"),
        "Website extensions request",
        "requests/s",
        "iis",
        "wmi.iis_website_isapi_extension_requests_rate",
        ChartType::Line,
        PRIO_IIS + 6,
        &[DimTemplate::incremental(id("iis_website_{0}_isapi_extension_requests_total"), "isapi")],
    ),
    chart(
        id("iis_website_{0}_errors_rate"),
        "Website errors",
        "errors/s",
        "iis",
        "wmi.iis_website_errors_rate",
        ChartType::Stacked,
        PRIO_IIS + 7,
        &[
            DimTemplate::incremental(id("iis_website_{0}_locked_errors_total"), "document_locked"),
            DimTemplate::incremental(id("iis_website_{0}_not_found_errors_total"), "document_not_found"),
        ],
    ),
    chart(
        id("iis_website_{0}_logon_attempts_rate"),
        "Website logon attempts",
        "attempts/s",
        "iis",
        "wmi.iis_website_logon_attempts_rate",
        ChartType::Line,
        PRIO_IIS + 8,
        &[DimTemplate::incremental(id("iis_website_{0}_logon_attempts_total"), "logon")],
    ),
    chart(
        id("iis_website_{0}_ftp_file_transfer_rate"),
        "Website FTP file transfer rate",
        "files/s",
        "iis",
        "wmi.iis_website_ftp_file_transfer_rate",
        ChartType::Line,
        PRIO_IIS + 9,
        &[
            DimTemplate::incremental(id("iis_website_{0}_files_received_total"), "received"),
            DimTemplate::incremental(id("iis_website_{0}_files_sent_total"), "sent"),
        ],
    ),
    chart(
        id("iis_website_{0}_uptime"),
        "Website uptime",
        "seconds",
        "iis",
        "wmi.iis_website_uptime",
        ChartType::Line,
        PRIO_IIS + 10,
        &[DimTemplate::absolute(id("iis_website_{0}_service_uptime"), "uptime")],
    ),
];

// Active Directory

const AD_CHARTS: &[ChartTemplate] = &[
    chart(
        fixed("ad_replication_intersite_compressed_traffic"),
        "Directory Services Replication Intersite Compressed Traffic",
        "bytes/s",
        "replication",
        "wmi.ad_replication_intersite_compressed_traffic",
        ChartType::Area,
        PRIO_AD,
        &[
            DimTemplate::incremental(
                fixed("ad_replication_data_intersite_bytes_total_inbound"),
                "inbound",
            ),
            DimTemplate::incremental(
                fixed("ad_replication_data_intersite_bytes_total_outbound"),
                "outbound",
            )
            .with_mul(-1),
        ],
    ),
    chart(
        fixed("ad_replication_intrasite_uncompressed_traffic"),
        "Directory Services Replication Intrasite Uncompressed Traffic",
        "bytes/s",
        "replication",
        "wmi.ad_replication_intrasite_uncompressed_traffic",
        ChartType::Area,
        PRIO_AD + 1,
        &[
            DimTemplate::incremental(
                fixed("ad_replication_data_intrasite_bytes_total_inbound"),
                "inbound",
            ),
            DimTemplate::incremental(
                fixed("ad_replication_data_intrasite_bytes_total_outbound"),
                "outbound",
            )
            .with_mul(-1),
        ],
    ),
    chart(
        fixed("ad_replication_sync_objects_remaining"),
        "Directory Services Replication Sync Objects Remaining",
        "objects",
        "replication",
        "wmi.ad_replication_sync_objects_remaining",
        ChartType::Line,
        PRIO_AD + 2,
        &[
            DimTemplate::absolute(
                fixed("ad_replication_inbound_sync_objects_remaining"),
                "inbound",
            ),
        ],
    ),
    chart(
        fixed("ad_replication_objects_filtered"),
        "Directory Services Replication Objects Filtered",
        "objects/s",
        "replication",
        "wmi.ad_replication_objects_filtered",
        ChartType::Line,
        PRIO_AD + 3,
        &[
            DimTemplate::incremental(
                fixed("ad_replication_inbound_objects_filtered_total"),
                "inbound",
            ),
        ],
    ),
    chart(
        fixed("ad_replication_properties_updated"),
        "Directory Services Replication Properties Updated",
        "properties/s",
        "replication",
        "wmi.ad_replication_properties_updated",
        ChartType::Line,
        PRIO_AD + 4,
        &[
            DimTemplate::incremental(
                fixed("ad_replication_inbound_properties_updated_total"),
                "inbound",
            ),
        ],
    ),
    chart(
        fixed("ad_replication_properties_filtered"),
        "Directory Services Replication Properties Filtered",
        "properties/s",
        "replication",
        "wmi.ad_replication_properties_filtered",
        ChartType::Line,
        PRIO_AD + 5,
        &[
            DimTemplate::incremental(
                fixed("ad_replication_inbound_properties_filtered_total"),
                "inbound",
            ),
        ],
    ),
    chart(
        fixed("ad_replication_pending_syncs"),
        "Directory Services Replication Pending Syncs",
        "syncs",
        "replication",
        "wmi.ad_replication_pending_syncs",
        ChartType::Line,
        PRIO_AD + 6,
        &[
            DimTemplate::absolute(fixed("ad_replication_pending_synchronizations"), "pending"),
        ],
    ),
    chart(
        fixed("ad_replication_sync_requests"),
        "Directory Services Replication Sync Requests",
        "requests/s",
        "replication",
        "wmi.ad_replication_sync_requests",
        ChartType::Line,
        PRIO_AD + 7,
        &[
            DimTemplate::incremental(fixed("ad_replication_sync_requests_total"), "requests"),
        ],
    ),
    chart(
        fixed("ad_ds_threads"),
        "Directory Services Threads",
        "threads",
        "threads",
        "wmi.ad_ds_threads",
        ChartType::Line,
        PRIO_AD + 8,
        &[
            DimTemplate::absolute(fixed("ad_directory_service_threads"), "in_use"),
        ],
    ),
    chart(
        fixed("ad_ldap_last_bind_time"),
        "LDAP Last Successful Bind Time",
        "seconds",
        "bind",
        "wmi.ad_ldap_last_bind_time",
        ChartType::Line,
        PRIO_AD + 9,
        &[
            DimTemplate::absolute(fixed("ad_ldap_last_bind_time_seconds"), "last_bind"),
        ],
    ),
    chart(
        fixed("ad_binds"),
        "Successful Binds",
        "binds/s",
        "bind",
        "wmi.ad_binds",
        ChartType::Line,
        PRIO_AD + 10,
        &[
            DimTemplate::incremental(fixed("ad_binds_total"), "binds"),
        ],
    ),
    chart(
        fixed("ad_ldap_searches"),
        "LDAP Client Search Operations",
        "searches/s",
        "ldap",
        "wmi.ad_ldap_searches",
        ChartType::Line,
        PRIO_AD + 11,
        &[
            DimTemplate::incremental(fixed("ad_ldap_searches_total"), "searches"),
        ],
    ),
];

// AD Certificate Services

const CERT_TEMPLATE_CHARTS: &[ChartTemplate] = &[
    chart(
        id("adcs_cert_template_{0}_requests"),
        "Certificate requests processed",
        "requests/s",
        "adcs",
        "wmi.adcs_cert_template_requests",
        ChartType::Line,
        PRIO_ADCS,
        &[DimTemplate::incremental(id("adcs_cert_template_{0}_requests_total"), "requests")],
    ),
    chart(
        id("adcs_cert_template_{0}_failed_requests"),
        "Certificate failed requests processed",
        "requests/s",
        "adcs",
        "wmi.adcs_cert_template_failed_requests",
        ChartType::Line,
        PRIO_ADCS + 1,
        &[DimTemplate::incremental(id("adcs_cert_template_{0}_failed_requests_total"), "failed")],
    ),
    chart(
        id("adcs_cert_template_{0}_issued_requests"),
        "Certificate issued requests processed",
        "requests/s",
        "adcs",
        "wmi.adcs_cert_template_issued_requests",
        ChartType::Line,
        PRIO_ADCS + 2,
        &[DimTemplate::incremental(id("adcs_cert_template_{0}_issued_requests_total"), "issued")],
    ),
    chart(
        id("adcs_cert_template_{0}_pending_requests"),
        "Certificate pending requests processed",
        "requests/s",
        "adcs",
        "wmi.adcs_cert_template_pending_requests",
        ChartType::Line,
        PRIO_ADCS + 3,
        &[DimTemplate::incremental(id("adcs_cert_template_{0}_pending_requests_total"), "pending")],
    ),
    chart(
        id("adcs_cert_template_{0}_request_processing_time"),
        "Certificate last request processing time",
        "seconds",
        "adcs",
        "wmi.adcs_cert_template_request_processing_time",
        ChartType::Line,
        PRIO_ADCS + 4,
        &[DimTemplate::absolute(
            id("adcs_cert_template_{0}_request_processing_time_seconds"),
            "processing_time",
        )
        .with_div(1000)],
    ),
    chart(
        id("adcs_cert_template_{0}_retrievals"),
        "Total of certificate retrievals",
        "retrievals/s",
        "adcs",
        "wmi.adcs_cert_template_retrievals",
        ChartType::Line,
        PRIO_ADCS + 5,
        &[DimTemplate::incremental(id("adcs_cert_template_{0}_retrievals_total"), "retrievals")],
    ),
    chart(
        id("adcs_cert_template_{0}_retrievals_processing_time"),
        "Certificate last retrieval processing time",
        "seconds",
        "adcs",
        "wmi.adcs_cert_template_retrievals_processing_time",
        ChartType::Line,
        PRIO_ADCS + 6,
        &[DimTemplate::absolute(
            id("adcs_cert_template_{0}_retrievals_processing_time_seconds"),
            "processing_time",
        )
        .with_div(1000)],
    ),
    chart(
        id("adcs_cert_template_{0}_request_cryptographic_signing_time"),
        "Certificate last signing operation request time",
        "seconds",
        "adcs",
        "wmi.adcs_cert_template_request_cryptographic_signing_time",
        ChartType::Line,
        PRIO_ADCS + 7,
        &[DimTemplate::absolute(
            id("adcs_cert_template_{0}_request_cryptographic_signing_time_seconds"),
            "singing_time",
        )
        .with_div(1000)],
    ),
    chart(
        id("adcs_cert_template_{0}_request_policy_module_processing_time"),
        "Certificate last policy module processing request time",
        "seconds",
        "adcs",
        "wmi.adcs_cert_template_request_policy_module_processing",
        ChartType::Line,
        PRIO_ADCS + 8,
        &[DimTemplate::absolute(
            id("adcs_cert_template_{0}_request_policy_module_processing_time_seconds"),
            "processing_time",
        )
        .with_div(1000)],
    ),
    chart(
        id("adcs_cert_template_{0}_challenge_responses"),
        "Certificate challenge responses",
        "responses/s",
        "adcs",
        "wmi.adcs_cert_template_challenge_responses",
        ChartType::Line,
        PRIO_ADCS + 9,
        &[DimTemplate::incremental(
            id("adcs_cert_template_{0}_challenge_responses_total"),
            "challenge",
        )],
    ),
    chart(
        id("adcs_cert_template_{0}_challenge_response_processing_time"),
        "Certificate last challenge response time",
        "seconds",
        "adcs",
        "wmi.adcs_cert_template_challenge_response_processing_time",
        ChartType::Line,
        PRIO_ADCS + 10,
        &[DimTemplate::absolute(
            id("adcs_cert_template_{0}_challenge_response_processing_time_seconds"),
            "processing_time",
        )
        .with_div(1000)],
    ),
    chart(
        id("adcs_cert_template_{0}_signed_certificate_timestamp_lists"),
        "Certificate Signed Certificate Timestamp Lists processed",
        "lists/s",
        "adcs",
        "wmi.adcs_cert_template_signed_certificate_timestamp_lists",
        ChartType::Line,
        PRIO_ADCS + 11,
        &[DimTemplate::incremental(
            id("adcs_cert_template_{0}_signed_certificate_timestamp_lists_total"),
            "processed",
        )],
    ),
    chart(
        id("adcs_cert_template_{0}_signed_certificate_timestamp_list_processing_time"),
        "Certificate last Signed Certificate Timestamp List process time",
        "seconds",
        "adcs",
        "wmi.adcs_cert_template_signed_certificate_timestamp_list_processing_time",
        ChartType::Line,
        PRIO_ADCS + 12,
        &[DimTemplate::absolute(
            id("adcs_cert_template_{0}_signed_certificate_timestamp_list_processing_time_seconds"),
            "processing_time",
        )
        .with_div(1000)],
    ),
];

// AD Federation Services

const ADFS_CHARTS: &[ChartTemplate] = &[
    chart(
        fixed("adfs_ad_login_connection_failures"),
        "Connection Failures",
        "failures/s",
        "ad",
        "wmi.adfs_ad_login_connection_failures",
        ChartType::Line,
        PRIO_ADFS,
        &[
            DimTemplate::incremental(
                fixed("adfs_ad_login_connection_failures_total"),
                "connection",
            ),
        ],
    ),
    chart(
        fixed("adfs_certificate_authentications"),
        "User Certificate Authentications",
        "authentications/s",
        "auth",
        "wmi.adfs_certificate_authentications",
        ChartType::Line,
        PRIO_ADFS + 1,
        &[
            DimTemplate::incremental(
                fixed("adfs_certificate_authentications_total"),
                "authentications",
            ),
        ],
    ),
    chart(
        fixed("adfs_db_artifact_failures"),
        "Connection Failures to the Artifact Database",
        "failures/s",
        "db artifact",
        "wmi.adfs_db_artifact_failures",
        ChartType::Line,
        PRIO_ADFS + 2,
        &[
            DimTemplate::incremental(fixed("adfs_db_artifact_failure_total"), "connection"),
        ],
    ),
    chart(
        fixed("adfs_db_artifact_query_time_seconds"),
        "Time Taken for an Artifact Database Query",
        "seconds/s",
        "db artifact",
        "wmi.adfs_db_artifact_query_time_seconds",
        ChartType::Line,
        PRIO_ADFS + 3,
        &[
            DimTemplate::incremental(
                fixed("adfs_db_artifact_query_time_seconds_total"),
                "query_time",
            )
            .with_div(1000),
        ],
    ),
    chart(
        fixed("adfs_db_config_failures"),
        "Connection Failures to the Configuration Database",
        "failures/s",
        "db config",
        "wmi.adfs_db_config_failures",
        ChartType::Line,
        PRIO_ADFS + 4,
        &[
            DimTemplate::incremental(fixed("adfs_db_config_failure_total"), "connection"),
        ],
    ),
    chart(
        fixed("adfs_db_config_query_time_seconds"),
        "Time Taken for a Configuration Database Query",
        "seconds/s",
        "db config",
        "wmi.adfs_db_config_query_time_seconds",
        ChartType::Line,
        PRIO_ADFS + 5,
        &[
            DimTemplate::incremental(
                fixed("adfs_db_config_query_time_seconds_total"),
                "query_time",
            )
            .with_div(1000),
        ],
    ),
    chart(
        fixed("adfs_device_authentications"),
        "Device Authentications",
        "authentications/s",
        "auth",
        "wmi.adfs_device_authentications",
        ChartType::Line,
        PRIO_ADFS + 6,
        &[
            DimTemplate::incremental(fixed("adfs_device_authentications_total"), "authentications"),
        ],
    ),
    chart(
        fixed("adfs_external_authentications"),
        "Authentications From External MFA Providers",
        "authentications/s",
        "auth",
        "wmi.adfs_external_authentications",
        ChartType::Line,
        PRIO_ADFS + 7,
        &[
            DimTemplate::incremental(
                fixed("adfs_external_authentications_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_external_authentications_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_federated_authentications"),
        "Authentications From Federated Sources",
        "authentications/s",
        "auth",
        "wmi.adfs_federated_authentications",
        ChartType::Line,
        PRIO_ADFS + 8,
        &[
            DimTemplate::incremental(
                fixed("adfs_federated_authentications_total"),
                "authentications",
            ),
        ],
    ),
    chart(
        fixed("adfs_federation_metadata_requests"),
        "Federation Metadata Requests",
        "requests/s",
        "requests",
        "wmi.adfs_federation_metadata_requests",
        ChartType::Line,
        PRIO_ADFS + 9,
        &[
            DimTemplate::incremental(fixed("adfs_federation_metadata_requests_total"), "requests"),
        ],
    ),
    chart(
        fixed("adfs_oauth_authorization_requests"),
        "Incoming Requests to the OAuth Authorization Endpoint",
        "requests/s",
        "oauth",
        "wmi.adfs_oauth_authorization_requests",
        ChartType::Line,
        PRIO_ADFS + 10,
        &[
            DimTemplate::incremental(fixed("adfs_oauth_authorization_requests_total"), "requests"),
        ],
    ),
    chart(
        fixed("adfs_oauth_client_authentications"),
        "OAuth Client Authentications",
        "authentications/s",
        "oauth",
        "wmi.adfs_oauth_client_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 11,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_client_authentication_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_client_authentication_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_client_credentials_requests"),
        "OAuth Client Credentials Requests",
        "requests/s",
        "oauth",
        "wmi.adfs_oauth_client_credentials_requests",
        ChartType::Stacked,
        PRIO_ADFS + 12,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_client_credentials_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_client_credentials_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_client_privkey_jwt_authentications"),
        "OAuth Client Private Key JWT Authentications",
        "authentications/s",
        "oauth",
        "wmi.adfs_oauth_client_privkey_jwt_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 13,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_client_privkey_jwt_authentications_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_client_privkey_jtw_authentication_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_client_secret_basic_authentications"),
        "OAuth Client Secret Basic Authentications",
        "authentications/s",
        "oauth",
        "wmi.adfs_oauth_client_secret_basic_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 14,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_client_secret_basic_authentications_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_client_secret_basic_authentications_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_client_secret_post_authentications"),
        "OAuth Client Secret Post Authentications",
        "authentications/s",
        "oauth",
        "wmi.adfs_oauth_client_secret_post_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 15,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_client_secret_post_authentications_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_client_secret_post_authentications_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_client_windows_authentications"),
        "OAuth Client Windows Integrated Authentications",
        "authentications/s",
        "oauth",
        "wmi.adfs_oauth_client_windows_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 16,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_client_windows_authentications_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_client_windows_authentications_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_logon_certificate_requests"),
        "OAuth Logon Certificate Requests",
        "requests/s",
        "oauth",
        "wmi.adfs_oauth_logon_certificate_requests",
        ChartType::Stacked,
        PRIO_ADFS + 17,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_logon_certificate_token_requests_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_logon_certificate_requests_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_password_grant_requests"),
        "OAuth Password Grant Requests",
        "requests/s",
        "oauth",
        "wmi.adfs_oauth_password_grant_requests",
        ChartType::Stacked,
        PRIO_ADFS + 18,
        &[
            DimTemplate::incremental(
                fixed("adfs_oauth_password_grant_requests_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_oauth_password_grant_requests_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_oauth_token_requests_success"),
        "Successful RP Token Requests Over OAuth Protocol",
        "requests/s",
        "oauth",
        "wmi.adfs_oauth_token_requests_success",
        ChartType::Line,
        PRIO_ADFS + 19,
        &[
            DimTemplate::incremental(fixed("adfs_oauth_token_requests_success_total"), "success"),
        ],
    ),
    chart(
        fixed("adfs_passive_requests"),
        "Passive Requests",
        "requests/s",
        "requests",
        "wmi.adfs_passive_requests",
        ChartType::Line,
        PRIO_ADFS + 20,
        &[
            DimTemplate::incremental(fixed("adfs_passive_requests_total"), "passive"),
        ],
    ),
    chart(
        fixed("adfs_passport_authentications"),
        "Microsoft Passport SSO Authentications",
        "authentications/s",
        "auth",
        "wmi.adfs_passport_authentications",
        ChartType::Line,
        PRIO_ADFS + 21,
        &[
            DimTemplate::incremental(fixed("adfs_passport_authentications_total"), "passport"),
        ],
    ),
    chart(
        fixed("adfs_password_change_requests"),
        "Password Change Requests",
        "requests/s",
        "requests",
        "wmi.adfs_password_change_requests",
        ChartType::Stacked,
        PRIO_ADFS + 22,
        &[
            DimTemplate::incremental(fixed("adfs_password_change_succeeded_total"), "success"),
            DimTemplate::incremental(fixed("adfs_password_change_failed_total"), "failure"),
        ],
    ),
    chart(
        fixed("adfs_samlp_token_requests_success"),
        "Successful RP Token Requests Over SAML-P Protocol",
        "requests/s",
        "requests",
        "wmi.adfs_samlp_token_requests_success",
        ChartType::Line,
        PRIO_ADFS + 23,
        &[
            DimTemplate::incremental(fixed("adfs_samlp_token_requests_success_total"), "success"),
        ],
    ),
    chart(
        fixed("adfs_sso_authentications"),
        "SSO Authentications",
        "authentications/s",
        "auth",
        "wmi.adfs_sso_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 24,
        &[
            DimTemplate::incremental(fixed("adfs_sso_authentications_success_total"), "success"),
            DimTemplate::incremental(fixed("adfs_sso_authentications_failure_total"), "failure"),
        ],
    ),
    chart(
        fixed("adfs_token_requests"),
        "Token Access Requests",
        "requests/s",
        "requests",
        "wmi.adfs_token_requests",
        ChartType::Line,
        PRIO_ADFS + 25,
        &[
            DimTemplate::incremental(fixed("adfs_token_requests_total"), "requests"),
        ],
    ),
    chart(
        fixed("adfs_userpassword_authentications"),
        "AD U/P Authentications",
        "authentications/s",
        "auth",
        "wmi.adfs_userpassword_authentications",
        ChartType::Stacked,
        PRIO_ADFS + 26,
        &[
            DimTemplate::incremental(
                fixed("adfs_userpassword_authentications_success_total"),
                "success",
            ),
            DimTemplate::incremental(
                fixed("adfs_userpassword_authentications_failure_total"),
                "failure",
            ),
        ],
    ),
    chart(
        fixed("adfs_windows_integrated_authentications"),
        "Windows Integrated Authentications Using Kerberos or NTLM",
        "authentications/s",
        "auth",
        "wmi.adfs_windows_integrated_authentications",
        ChartType::Line,
        PRIO_ADFS + 27,
        &[
            DimTemplate::incremental(
                fixed("adfs_windows_integrated_authentications_total"),
                "authentications",
            ),
        ],
    ),
    chart(
        fixed("adfs_wsfed_token_requests_success"),
        "Successful RP Token Requests Over WS-Fed Protocol",
        "requests/s",
        "requests",
        "wmi.adfs_wsfed_token_requests_success",
        ChartType::Line,
        PRIO_ADFS + 28,
        &[
            DimTemplate::incremental(fixed("adfs_wsfed_token_requests_success_total"), "success"),
        ],
    ),
    chart(
        fixed("adfs_wstrust_token_requests_success"),
        "Successful RP Token Requests Over WS-Trust Protocol",
        "requests/s",
        "requests",
        "wmi.adfs_wstrust_token_requests_success",
        ChartType::Line,
        PRIO_ADFS + 29,
        &[
            DimTemplate::incremental(fixed("adfs_wstrust_token_requests_success_total"), "success"),
        ],
    ),
    chart(
        fixed("adfs_extranet_account_lockouts"),
        "Extranet Account Lockouts",
        "lockouts/s",
        "auth",
        "wmi.adfs_extranet_account_lockouts",
        ChartType::Line,
        PRIO_ADFS + 30,
        &[
            DimTemplate::incremental(fixed("adfs_extranet_account_lockouts_total"), "lockouts"),
        ],
    ),
];

// MS SQL Server

const MSSQL_INSTANCE_CHARTS: &[ChartTemplate] = &[
    chart(
        id("mssql_instance_{0}_user_connection"),
        "User connections",
        "connections",
        "mssql",
        "wmi.mssql_instance_user_connection",
        ChartType::Line,
        PRIO_MSSQL,
        &[DimTemplate::absolute(id("mssql_instance_{0}_genstats_user_connections"), "user")],
    ),
    chart(
        id("mssql_instance_{0}_blocked_process"),
        "Blocked processes",
        "process",
        "mssql",
        "wmi.mssql_instance_blocked_processes",
        ChartType::Line,
        PRIO_MSSQL + 1,
        &[DimTemplate::absolute(id("mssql_instance_{0}_genstats_blocked_processes"), "blocked")],
    ),
    chart(
        id("mssql_instance_{0}_cache_hit_ratio"),
        "Buffer Cache hit ratio",
        "percentage",
        "mssql",
        "wmi.mssql_instance_cache_hit_ratio",
        ChartType::Line,
        PRIO_MSSQL + 2,
        &[DimTemplate::absolute(id("mssql_instance_{0}_cache_hit_ratio"), "hit_ratio")],
    ),
    chart(
        id("mssql_instance_{0}_bufman_checkpoint_pages"),
        "Flushed pages",
        "pages/s",
        "mssql",
        "wmi.mssql_instance_bufman_checkpoint_pages",
        ChartType::Line,
        PRIO_MSSQL + 3,
        &[DimTemplate::incremental(id("mssql_instance_{0}_bufman_checkpoint_pages"), "flushed")],
    ),
    chart(
        id("mssql_instance_{0}_bufman_page_life_expectancy"),
        "Page life expectancy",
        "seconds",
        "mssql",
        "wmi.mssql_instance_bufman_page_life_expectancy",
        ChartType::Line,
        PRIO_MSSQL + 4,
        &[DimTemplate::absolute(
            id("mssql_instance_{0}_bufman_page_life_expectancy_seconds"),
            "life_expectancy",
        )],
    ),
    chart(
        id("mssql_instance_{0}_bufman_iops"),
        "Number of pages input and output",
        "pages/s",
        "mssql",
        "wmi.mssql_instance_bufman_iops",
        ChartType::Line,
        PRIO_MSSQL + 5,
        &[
            DimTemplate::incremental(id("mssql_instance_{0}_bufman_page_reads"), "read"),
            DimTemplate::incremental(id("mssql_instance_{0}_bufman_page_writes"), "written").with_mul(-1),
        ],
    ),
    chart(
        id("mssql_instance_{0}_accessmethods_page_splits"),
        "Page splits",
        "splits/s",
        "mssql",
        "wmi.mssql_instance_accessmethods_page_splits",
        ChartType::Line,
        PRIO_MSSQL + 6,
        &[DimTemplate::incremental(id("mssql_instance_{0}_accessmethods_page_splits"), "page")],
    ),
    chart(
        id("mssql_instance_{0}_memmgr_pending_memory_grants"),
        "Processes waiting for memory grant",
        "processes",
        "mssql",
        "wmi.mssql_instance_memmgr_pending_memory_grants",
        ChartType::Line,
        PRIO_MSSQL + 7,
        &[DimTemplate::absolute(id("mssql_instance_{0}_memmgr_pending_memory_grants"), "pending")],
    ),
    chart(
        id("mssql_instance_{0}_memmgr_server_memory"),
        "Memory committed",
        "bytes",
        "mssql",
        "wmi.mssql_instance_memmgr_server_memory",
        ChartType::Line,
        PRIO_MSSQL + 8,
        &[DimTemplate::absolute(id("mssql_instance_{0}_memmgr_total_server_memory_bytes"), "memory")],
    ),
    chart(
        id("mssql_instance_{0}_sqlstats_auto_parameterization_attempts"),
        "Failed auto-parameterization attempts",
        "attempts/s",
        "mssql",
        "wmi.mssql_instance_sqlstats_auto_parameterization_attempts",
        ChartType::Line,
        PRIO_MSSQL + 9,
        &[DimTemplate::incremental(
            id("mssql_instance_{0}_sqlstats_auto_parameterization_attempts"),
            "failed",
        )],
    ),
    chart(
        id("mssql_instance_{0}_sqlstats_safe_auto_parameterization_attempts"),
        "Safe auto-parameterization attempts",
        "attempts/s",
        "mssql",
        "wmi.mssql_instance_sqlstats_safe_auto_parameterization_attempts",
        ChartType::Line,
        PRIO_MSSQL + 10,
        &[DimTemplate::incremental(
            id("mssql_instance_{0}_sqlstats_safe_auto_parameterization_attempts"),
            "safe",
        )],
    ),
    chart(
        id("mssql_instance_{0}_sqlstats_sql_compilations"),
        "SQL compilations",
        "compilations/s",
        "mssql",
        "wmi.mssql_instance_sqlstats_sql_compilations",
        ChartType::Line,
        PRIO_MSSQL + 11,
        &[DimTemplate::incremental(id("mssql_instance_{0}_sqlstats_sql_compilations"), "compilations")],
    ),
    chart(
        id("mssql_instance_{0}_sqlstats_sql_recompilations"),
        "SQL re-compilations",
        "recompiles/s",
        "mssql",
        "wmi.mssql_instance_sqlstats_sql_recompilations",
        ChartType::Line,
        PRIO_MSSQL + 12,
        &[DimTemplate::incremental(
            id("mssql_instance_{0}_sqlstats_sql_recompilations"),
            "recompiles",
        )],
    ),
    chart(
        id("mssql_instance_{0}_locks_lock_wait"),
        "Lock requests that required the caller to wait",
        "locks/s",
        "mssql",
        "wmi.mssql_instance_locks_lock_wait",
        ChartType::Line,
        PRIO_MSSQL + 13,
        &[
            DimTemplate::incremental(id("mssql_instance_{0}_resource_AllocUnit_locks_lock_wait_seconds"), "alloc_unit"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Application_locks_lock_wait_seconds"), "application"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Database_locks_lock_wait_seconds"), "database"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Extent_locks_lock_wait_seconds"), "extent"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_File_locks_lock_wait_seconds"), "file"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_HoBT_locks_lock_wait_seconds"), "hobt"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Key_locks_lock_wait_seconds"), "key"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Metadata_locks_lock_wait_seconds"), "metadata"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_OIB_locks_lock_wait_seconds"), "oib"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Object_locks_lock_wait_seconds"), "object"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Page_locks_lock_wait_seconds"), "page"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_RID_locks_lock_wait_seconds"), "rid"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_RowGroup_locks_lock_wait_seconds"), "row_group"),
            DimTemplate::incremental(id("mssql_instance_{0}_resource_Xact_locks_lock_wait_seconds"), "xact"),
        ],
    ),
];

const MSSQL_DATABASE_CHARTS: &[ChartTemplate] = &[
    chart(
        db("mssql_db_{1}_instance_{0}_active_transactions"),
        "Active transactions per database",
        "transactions",
        "mssql",
        "wmi.mssql_database_active_transactions",
        ChartType::Line,
        PRIO_MSSQL + 20,
        &[DimTemplate::absolute(
            db("mssql_db_{1}_instance_{0}_active_transactions"),
            "active",
        )],
    ),
    chart(
        db("mssql_db_{1}_instance_{0}_transactions"),
        "Transactions",
        "transactions/s",
        "mssql",
        "wmi.mssql_database_transactions",
        ChartType::Line,
        PRIO_MSSQL + 21,
        &[DimTemplate::incremental(
            db("mssql_db_{1}_instance_{0}_transactions"),
            "transactions",
        )],
    ),
    chart(
        db("mssql_db_{1}_instance_{0}_write_transactions"),
        "Write transactions",
        "transactions/s",
        "mssql",
        "wmi.mssql_database_write_transactions",
        ChartType::Line,
        PRIO_MSSQL + 22,
        &[DimTemplate::incremental(
            db("mssql_db_{1}_instance_{0}_write_transactions"),
            "write",
        )],
    ),
    chart(
        db("mssql_db_{1}_instance_{0}_log_flushes"),
        "Log flushes",
        "flushes/s",
        "mssql",
        "wmi.mssql_database_log_flushes",
        ChartType::Line,
        PRIO_MSSQL + 23,
        &[DimTemplate::incremental(
            db("mssql_db_{1}_instance_{0}_log_flushes"),
            "flushes",
        )],
    ),
    chart(
        db("mssql_db_{1}_instance_{0}_log_flushed"),
        "Log flushed",
        "bytes/s",
        "mssql",
        "wmi.mssql_database_log_flushed",
        ChartType::Line,
        PRIO_MSSQL + 24,
        &[DimTemplate::incremental(
            db("mssql_db_{1}_instance_{0}_log_flushed_bytes"),
            "flushed",
        )],
    ),
    chart(
        db("mssql_db_{1}_instance_{0}_backup_restore_operations"),
        "Backup IO per database",
        "operations/s",
        "mssql",
        "wmi.mssql_database_backup_restore_operations",
        ChartType::Line,
        PRIO_MSSQL + 25,
        &[DimTemplate::incremental(
            db("mssql_db_{1}_instance_{0}_backup_restore_operations"),
            "backup",
        )],
    ),
    chart(
        db("mssql_db_{1}_instance_{0}_data_files_size"),
        "Current database size",
        "bytes",
        "mssql",
        "wmi.mssql_database_data_files_size",
        ChartType::Line,
        PRIO_MSSQL + 26,
        &[DimTemplate::absolute(
            db("mssql_db_{1}_instance_{0}_data_files_size_bytes"),
            "size",
        )],
    ),
];

// Exporter sub-collectors

const COLLECTOR_CHARTS: &[ChartTemplate] = &[
    chart(
        id("collector_{0}_duration"),
        "Duration of a data collection",
        "ms",
        "collection",
        "wmi.collector_duration",
        ChartType::Line,
        PRIO_COLLECTORS,
        &[DimTemplate::absolute(id("collector_{0}_duration"), "duration")],
    ),
    chart(
        id("collector_{0}_status"),
        "Status of a data collection",
        "status",
        "collection",
        "wmi.collector_status",
        ChartType::Line,
        PRIO_COLLECTORS + 1,
        &[
            DimTemplate::absolute(id("collector_{0}_status_success"), "success"),
            DimTemplate::absolute(id("collector_{0}_status_fail"), "fail"),
        ],
    ),
];

/// Fixed charts of a sub-collector family. Families whose charts are all per
/// entity have none.
fn family_charts(family: Family) -> &'static [ChartTemplate] {
    match family {
        Family::Cpu => CPU_CHARTS,
        Family::Memory => MEMORY_CHARTS,
        Family::Os => OS_CHARTS,
        Family::System => SYSTEM_CHARTS,
        Family::Tcp => TCP_CHARTS,
        Family::Logon => LOGON_CHARTS,
        Family::Process => PROCESSES_CHARTS,
        Family::Ad => AD_CHARTS,
        Family::Adfs => ADFS_CHARTS,
        Family::LogicalDisk
        | Family::Net
        | Family::ThermalZone
        | Family::Service
        | Family::Iis
        | Family::Adcs
        | Family::Mssql => &[],
    }
}

/// Plans per-process dimensions on the fixed process charts.
fn process_dims(name: &EntityId) -> Result<Vec<ChartChange>, MaterializeError> {
    let parts = name.parts();
    let label = parts.first().map(String::as_str).unwrap_or_default();
    PROCESS_DIMS
        .iter()
        .map(|(chart_id, template)| {
            let mut dim = template.instantiate(parts)?;
            dim.name = label.to_string();
            Ok(ChartChange::AddDims {
                chart_id: (*chart_id).to_string(),
                dims: vec![dim],
            })
        })
        .collect()
}

/// Maps every entity class the wmi normalizer emits to its charts.
#[derive(Debug, Default, Clone, Copy)]
pub struct WmiCharts;

impl EntityCharts for WmiCharts {
    fn plan(
        &self,
        class: EntityClass,
        id: &EntityId,
        metrics: &Snapshot,
    ) -> Result<Vec<ChartChange>, MaterializeError> {
        let parts = id.parts();
        match class {
            EntityClass::Family => {
                let name = parts.first().map(String::as_str).unwrap_or_default();
                let family = Family::from_name(name)
                    .ok_or(MaterializeError::UnsupportedClass(EntityClass::Family))?;
                // Some inputs of a family (e.g. memory "used" needs the cs
                // collector) are optional.
                add_backed_charts::<&str>(family_charts(family), &[], metrics)
            }
            EntityClass::Collector => add_charts(COLLECTOR_CHARTS, parts),
            EntityClass::Core => add_backed_charts(CORE_CHARTS, parts, metrics),
            EntityClass::Volume => add_charts(VOLUME_CHARTS, parts),
            EntityClass::Nic => add_charts(NIC_CHARTS, parts),
            EntityClass::ThermalZone => add_charts(THERMAL_ZONE_CHARTS, parts),
            EntityClass::Process => process_dims(id),
            EntityClass::Service => add_charts(SERVICE_CHARTS, parts),
            EntityClass::Website => add_charts(WEBSITE_CHARTS, parts),
            EntityClass::CertTemplate => add_charts(CERT_TEMPLATE_CHARTS, parts),
            EntityClass::MssqlInstance => add_backed_charts(MSSQL_INSTANCE_CHARTS, parts, metrics),
            EntityClass::MssqlDatabase => add_charts(MSSQL_DATABASE_CHARTS, parts),
            EntityClass::Gpu | EntityClass::Peer | EntityClass::GarbageCollector => {
                Err(MaterializeError::UnsupportedClass(class))
            }
        }
    }
}
