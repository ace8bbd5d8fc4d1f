//! Cassandra JMX exporter samples to metrics.
//!
//! Only the keyspace-wide aggregates of the table metrics are kept; series
//! carrying a `keyspace` label describe a single table.

use crate::charts::sanitize_id;
use crate::collector::{EntityClass, EntityId, Normalized};
use crate::prometheus::Sample;

/// Entity id of the one family the normalizer reports.
pub const FAMILY: &str = "cassandra";

const PREFIX: &str = "org_apache_cassandra_metrics_";

/// Table metrics (`*_table_count` and `*_table_value`) charted per node.
const TABLE_METRICS: &[&str] = &[
    "CompactionBytesWritten",
    "LiveDiskSpaceUsed",
    "TotalDiskSpaceUsed",
    "PendingCompactions",
];

/// Client request metric name to output prefix.
const CLIENT_REQUESTS: &[(&str, &str)] = &[
    ("Latency", "throughput"),
    ("TotalLatency", "latency"),
    ("Timeouts", "error_timeout"),
    ("Unavailables", "error_unavailable"),
];

fn ratio_to_percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn seconds_to_ms(value: f64) -> i64 {
    (value * 1000.0).round() as i64
}

/// Converts one scrape into metrics.
///
/// `now` is the unix time used to turn the process start time into uptime.
pub fn normalize(samples: &[Sample], now: i64) -> Normalized {
    let mut n = Normalized::new();
    let mut known = false;

    for sample in samples.iter().filter(|s| s.value.is_finite()) {
        known |= match sample.name.strip_prefix(PREFIX) {
            Some(kind) => collect_cassandra(&mut n, kind, sample),
            None => collect_jvm(&mut n, sample, now),
        };
    }

    if known {
        n.see(EntityClass::Family, EntityId::new(FAMILY));
    }
    n
}

fn collect_cassandra(n: &mut Normalized, kind: &str, sample: &Sample) -> bool {
    let Some(name) = sample.label("name") else {
        return false;
    };
    match kind {
        "cache_value" => {
            if name != "HitRate" || sample.label("scope") != Some("KeyCache") {
                return false;
            }
            n.set("cache_HitRate", ratio_to_percent(sample.value));
        }
        "table_count" | "table_value" => {
            if sample.label("keyspace").is_some() || !TABLE_METRICS.contains(&name) {
                return false;
            }
            n.set(format!("disk_{name}"), sample.value as i64);
        }
        "clientrequest_count" => {
            let Some(scope) = sample.label("scope").filter(|s| matches!(*s, "Read" | "Write")) else {
                return false;
            };
            let Some((_, to)) = CLIENT_REQUESTS.iter().find(|(from, _)| *from == name) else {
                return false;
            };
            n.set(format!("{to}_{scope}"), sample.value as i64);
        }
        "threadpools_value" => {
            if name != "PendingTasks" {
                return false;
            }
            // Summed over every thread pool.
            n.add("pending_tasks_tasks", sample.value as i64);
        }
        _ => return false,
    }
    true
}

fn collect_jvm(n: &mut Normalized, sample: &Sample, now: i64) -> bool {
    match sample.name.as_str() {
        "jvm_gc_collection_seconds_count" | "jvm_gc_collection_seconds_sum" => {
            let Some(gc) = sample.label("gc").map(sanitize_id) else {
                return false;
            };
            if sample.name.ends_with("_count") {
                n.set(format!("java_gc_count_{gc}"), sample.value as i64);
            } else {
                n.set(format!("java_gc_time_{gc}"), seconds_to_ms(sample.value));
            }
            n.see(EntityClass::GarbageCollector, EntityId::new(gc));
        }
        "process_start_time_seconds" => {
            n.set("system_up_time", (now - sample.value as i64).max(0));
        }
        _ => return false,
    }
    true
}
