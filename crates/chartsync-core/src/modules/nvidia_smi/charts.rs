//! Chart catalog of the nvidia_smi module: one set of charts per GPU.

use crate::charts::{ChartChange, ChartTemplate, ChartType, DimTemplate, IdTemplate};
use crate::collector::{EntityCharts, EntityClass, EntityId, Snapshot, add_backed_charts};
use crate::error::MaterializeError;

use super::collect::POWER_PRECISION;

const PRIO_GPU: u32 = 1000;

const fn id(pattern: &'static str) -> IdTemplate {
    IdTemplate::new(pattern, 1)
}

const fn gpu_chart(
    chart_id: &'static str,
    title: &'static str,
    units: &'static str,
    context: &'static str,
    chart_type: ChartType,
    priority: u32,
    dims: &'static [DimTemplate],
) -> ChartTemplate {
    ChartTemplate {
        id: id(chart_id),
        title,
        units,
        family: "gpu",
        context,
        chart_type,
        priority,
        dims,
        vars: &[],
    }
}

const fn pstate(dim_id: &'static str, name: &'static str) -> DimTemplate {
    DimTemplate::absolute(id(dim_id), name)
}

const GPU_CHARTS: &[ChartTemplate] = &[
    gpu_chart(
        "gpu_{0}_fan_speed_perc",
        "Fan speed",
        "%",
        "nvidia_smi.gpu_fan_speed_perc",
        ChartType::Line,
        PRIO_GPU,
        &[DimTemplate::absolute(id("gpu_{0}_fan_speed_perc"), "fan_speed")],
    ),
    gpu_chart(
        "gpu_{0}_gpu_utilization",
        "GPU utilization",
        "%",
        "nvidia_smi.gpu_utilization",
        ChartType::Line,
        PRIO_GPU + 1,
        &[DimTemplate::absolute(id("gpu_{0}_gpu_utilization"), "gpu")],
    ),
    gpu_chart(
        "gpu_{0}_mem_utilization",
        "Memory utilization",
        "%",
        "nvidia_smi.gpu_memory_utilization",
        ChartType::Line,
        PRIO_GPU + 2,
        &[DimTemplate::absolute(id("gpu_{0}_mem_utilization"), "memory")],
    ),
    gpu_chart(
        "gpu_{0}_frame_buffer_memory_usage",
        "Frame buffer memory usage",
        "B",
        "nvidia_smi.gpu_frame_buffer_memory_usage",
        ChartType::Stacked,
        PRIO_GPU + 3,
        &[
            DimTemplate::absolute(id("gpu_{0}_frame_buffer_memory_usage_free"), "free"),
            DimTemplate::absolute(id("gpu_{0}_frame_buffer_memory_usage_used"), "used"),
        ],
    ),
    gpu_chart(
        "gpu_{0}_frame_buffer_memory_reserved",
        "Frame buffer memory reserved by the driver",
        "B",
        "nvidia_smi.gpu_frame_buffer_memory_reserved",
        ChartType::Line,
        PRIO_GPU + 4,
        &[DimTemplate::absolute(id("gpu_{0}_frame_buffer_memory_usage_reserved"), "reserved")],
    ),
    gpu_chart(
        "gpu_{0}_temperature",
        "Temperature",
        "Celsius",
        "nvidia_smi.gpu_temperature",
        ChartType::Line,
        PRIO_GPU + 5,
        &[DimTemplate::absolute(id("gpu_{0}_temperature"), "temperature")],
    ),
    gpu_chart(
        "gpu_{0}_clock_freq",
        "Clock current frequency",
        "MHz",
        "nvidia_smi.gpu_clock_freq",
        ChartType::Line,
        PRIO_GPU + 6,
        &[
            DimTemplate::absolute(id("gpu_{0}_graphics_clock"), "graphics"),
            DimTemplate::absolute(id("gpu_{0}_video_clock"), "video"),
            DimTemplate::absolute(id("gpu_{0}_sm_clock"), "sm"),
            DimTemplate::absolute(id("gpu_{0}_mem_clock"), "mem"),
        ],
    ),
    gpu_chart(
        "gpu_{0}_power_draw",
        "Power draw",
        "Watts",
        "nvidia_smi.gpu_power_draw",
        ChartType::Line,
        PRIO_GPU + 7,
        &[DimTemplate::absolute(id("gpu_{0}_power_draw"), "power_draw").with_div(POWER_PRECISION)],
    ),
    gpu_chart(
        "gpu_{0}_performance_state",
        "Performance state",
        "state",
        "nvidia_smi.gpu_performance_state",
        ChartType::Line,
        PRIO_GPU + 8,
        &[
            pstate("gpu_{0}_performance_state_P0", "P0"),
            pstate("gpu_{0}_performance_state_P1", "P1"),
            pstate("gpu_{0}_performance_state_P2", "P2"),
            pstate("gpu_{0}_performance_state_P3", "P3"),
            pstate("gpu_{0}_performance_state_P4", "P4"),
            pstate("gpu_{0}_performance_state_P5", "P5"),
            pstate("gpu_{0}_performance_state_P6", "P6"),
            pstate("gpu_{0}_performance_state_P7", "P7"),
            pstate("gpu_{0}_performance_state_P8", "P8"),
            pstate("gpu_{0}_performance_state_P9", "P9"),
            pstate("gpu_{0}_performance_state_P10", "P10"),
            pstate("gpu_{0}_performance_state_P11", "P11"),
            pstate("gpu_{0}_performance_state_P12", "P12"),
            pstate("gpu_{0}_performance_state_P13", "P13"),
            pstate("gpu_{0}_performance_state_P14", "P14"),
            pstate("gpu_{0}_performance_state_P15", "P15"),
        ],
    ),
];

/// Creates per-GPU charts. The product name label comes with the entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpuCharts;

impl EntityCharts for GpuCharts {
    fn plan(
        &self,
        class: EntityClass,
        id: &EntityId,
        metrics: &Snapshot,
    ) -> Result<Vec<ChartChange>, MaterializeError> {
        let EntityClass::Gpu = class else {
            return Err(MaterializeError::UnsupportedClass(class));
        };
        // Readings the GPU does not support are missing from the snapshot.
        add_backed_charts(GPU_CHARTS, id.parts(), metrics)
    }
}
