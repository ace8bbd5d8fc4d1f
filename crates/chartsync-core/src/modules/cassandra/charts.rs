//! Chart catalog of the cassandra module.

use crate::charts::{ChartChange, ChartTemplate, ChartType, DimTemplate, IdTemplate};
use crate::collector::{EntityCharts, EntityClass, EntityId, Snapshot, add_backed_charts};
use crate::error::MaterializeError;

use super::collect::FAMILY;

const PRIO_REQUESTS: u32 = 1000;
const PRIO_CACHE: u32 = 1100;
const PRIO_STORAGE: u32 = 1200;
const PRIO_COMPACTION: u32 = 1300;
const PRIO_THREAD_POOLS: u32 = 1400;
const PRIO_JVM: u32 = 1500;

const fn fixed(pattern: &'static str) -> IdTemplate {
    IdTemplate::fixed(pattern)
}

#[allow(clippy::too_many_arguments)]
const fn chart(
    id: &'static str,
    title: &'static str,
    units: &'static str,
    family: &'static str,
    context: &'static str,
    chart_type: ChartType,
    priority: u32,
    dims: &'static [DimTemplate],
) -> ChartTemplate {
    ChartTemplate {
        id: fixed(id),
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

const NODE_CHARTS: &[ChartTemplate] = &[
    chart(
        "client_requests_rate",
        "Client requests rate",
        "requests/s",
        "throughput",
        "cassandra.client_requests_rate",
        ChartType::Line,
        PRIO_REQUESTS,
        &[
            DimTemplate::incremental(fixed("throughput_Read"), "read"),
            DimTemplate::incremental(fixed("throughput_Write"), "write").with_mul(-1),
        ],
    ),
    chart(
        "client_requests_latency",
        "Client requests total latency",
        "microseconds",
        "latency",
        "cassandra.client_requests_latency",
        ChartType::Line,
        PRIO_REQUESTS + 1,
        &[
            DimTemplate::incremental(fixed("latency_Read"), "read"),
            DimTemplate::incremental(fixed("latency_Write"), "write").with_mul(-1),
        ],
    ),
    chart(
        "client_requests_timeouts",
        "Client requests timeouts",
        "timeouts/s",
        "errors",
        "cassandra.client_requests_timeouts",
        ChartType::Line,
        PRIO_REQUESTS + 2,
        &[
            DimTemplate::incremental(fixed("error_timeout_Read"), "read"),
            DimTemplate::incremental(fixed("error_timeout_Write"), "write").with_mul(-1),
        ],
    ),
    chart(
        "client_requests_unavailables",
        "Client requests unavailable exceptions",
        "exceptions/s",
        "errors",
        "cassandra.client_requests_unavailables",
        ChartType::Line,
        PRIO_REQUESTS + 3,
        &[
            DimTemplate::incremental(fixed("error_unavailable_Read"), "read"),
            DimTemplate::incremental(fixed("error_unavailable_Write"), "write").with_mul(-1),
        ],
    ),
    chart(
        "key_cache_hit_ratio",
        "Key cache hit ratio",
        "percentage",
        "cache",
        "cassandra.key_cache_hit_ratio",
        ChartType::Line,
        PRIO_CACHE,
        &[DimTemplate::absolute(fixed("cache_HitRate"), "hit_ratio")],
    ),
    chart(
        "storage_live_disk_space_used",
        "Disk space used by live SSTables",
        "bytes",
        "disk",
        "cassandra.storage_live_disk_space_used",
        ChartType::Area,
        PRIO_STORAGE,
        &[
            DimTemplate::absolute(fixed("disk_LiveDiskSpaceUsed"), "live"),
            DimTemplate::absolute(fixed("disk_TotalDiskSpaceUsed"), "total"),
        ],
    ),
    chart(
        "compaction_compacted_rate",
        "Compaction flow",
        "bytes/s",
        "disk",
        "cassandra.compaction_compacted_rate",
        ChartType::Line,
        PRIO_COMPACTION,
        &[DimTemplate::incremental(fixed("disk_CompactionBytesWritten"), "compacted")],
    ),
    chart(
        "compaction_pending_tasks",
        "Pending compactions",
        "tasks",
        "disk",
        "cassandra.compaction_pending_tasks",
        ChartType::Line,
        PRIO_COMPACTION + 1,
        &[DimTemplate::absolute(fixed("disk_PendingCompactions"), "pending")],
    ),
    chart(
        "thread_pools_pending_tasks",
        "Pending tasks across thread pools",
        "tasks",
        "thread pools",
        "cassandra.thread_pools_pending_tasks",
        ChartType::Line,
        PRIO_THREAD_POOLS,
        &[DimTemplate::absolute(fixed("pending_tasks_tasks"), "pending")],
    ),
    chart(
        "jvm_gc_rate",
        "Garbage collections rate",
        "gc/s",
        "jvm",
        "cassandra.jvm_gc_rate",
        ChartType::Stacked,
        PRIO_JVM,
        &[],
    ),
    chart(
        "jvm_gc_time",
        "Garbage collection time",
        "milliseconds",
        "jvm",
        "cassandra.jvm_gc_time",
        ChartType::Stacked,
        PRIO_JVM + 1,
        &[],
    ),
    chart(
        "uptime",
        "Uptime",
        "seconds",
        "uptime",
        "cassandra.uptime",
        ChartType::Line,
        PRIO_JVM + 2,
        &[DimTemplate::absolute(fixed("system_up_time"), "uptime")],
    ),
];

/// Dimensions every garbage collector adds to the fixed JVM charts.
const GC_DIMS: &[(&str, DimTemplate)] = &[
    (
        "jvm_gc_rate",
        DimTemplate::incremental(IdTemplate::new("java_gc_count_{0}", 1), "gc"),
    ),
    (
        "jvm_gc_time",
        DimTemplate::incremental(IdTemplate::new("java_gc_time_{0}", 1), "gc"),
    ),
];

fn gc_dims(gc: &EntityId) -> Result<Vec<ChartChange>, MaterializeError> {
    let parts = gc.parts();
    let name = parts.first().map(String::as_str).unwrap_or_default();
    GC_DIMS
        .iter()
        .map(|(chart_id, template)| {
            let mut dim = template.instantiate(parts)?;
            dim.name = name.to_string();
            Ok(ChartChange::AddDims {
                chart_id: (*chart_id).to_string(),
                dims: vec![dim],
            })
        })
        .collect()
}

/// Node-wide charts plus one dimension pair per garbage collector.
#[derive(Debug, Default, Clone, Copy)]
pub struct CassandraCharts;

impl EntityCharts for CassandraCharts {
    fn plan(
        &self,
        class: EntityClass,
        id: &EntityId,
        metrics: &Snapshot,
    ) -> Result<Vec<ChartChange>, MaterializeError> {
        match class {
            EntityClass::Family if id.parts().first().map(String::as_str) == Some(FAMILY) => {
                // The exporter can be configured to drop any of these beans.
                add_backed_charts::<&str>(NODE_CHARTS, &[], metrics)
            }
            EntityClass::GarbageCollector => gc_dims(id),
            _ => Err(MaterializeError::UnsupportedClass(class)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartSet;
    use crate::collector::{ChartSynchronizer, EntityRegistry, SeenSet};

    #[test]
    fn test_all_templates_render() {
        for t in NODE_CHARTS {
            t.instantiate::<&str>(&[]).unwrap();
        }
        for (_, dim) in GC_DIMS {
            dim.instantiate(&["ParNew"]).unwrap();
        }
    }

    #[test]
    fn test_gc_dims_land_on_fixed_charts() {
        let mut registry = EntityRegistry::new();
        let mut charts = ChartSet::new();
        let mut seen = SeenSet::new();
        seen.insert(EntityClass::Family, FAMILY.into());
        seen.insert(EntityClass::GarbageCollector, "ParNew".into());

        let mx: Snapshot = [("java_gc_count_ParNew", 8), ("java_gc_time_ParNew", 8)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let report = ChartSynchronizer::new(&mut registry, &mut charts).sync_all(&CassandraCharts, &seen, &mx);

        assert!(report.failed.is_empty());
        let rate = charts.get_chart("jvm_gc_rate").unwrap();
        assert!(rate.has_dim("java_gc_count_ParNew"));
        assert_eq!(rate.dims[0].name, "ParNew");
        assert!(charts.get_chart("jvm_gc_time").unwrap().has_dim("java_gc_time_ParNew"));
        // Every other node chart waits for its inputs.
        assert_eq!(charts.len(), 2);
        assert!(registry.pending(EntityClass::Family, &FAMILY.into()).is_some());
    }

    #[test]
    fn test_other_classes_are_unsupported() {
        let mx = Snapshot::new();
        assert!(CassandraCharts.plan(EntityClass::Gpu, &"0".into(), &mx).is_err());
        assert!(CassandraCharts.plan(EntityClass::Family, &"memory".into(), &mx).is_err());
    }
}
