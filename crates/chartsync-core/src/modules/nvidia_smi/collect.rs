//! Decoding `nvidia-smi` output and turning it into metrics.
//!
//! Both output formats are decoded into [`GpuInfo`] first:
//! - CSV (`--query-gpu=... --format=csv,nounits`): a header naming the
//!   queried properties, then one row per GPU.
//! - XML (`-q -x`): the full report, one `<gpu>` element per GPU.
//!
//! Readings the driver does not provide (`N/A`, `[N/A]`, `[Not Supported]`)
//! are `None` and never reach the snapshot.

use serde::Deserialize;

use crate::charts::sanitize_id;
use crate::collector::{EntityClass, EntityId, Normalized};
use crate::error::ParseError;

const MIB: f64 = 1024.0 * 1024.0;

/// `power_draw` is collected in milliwatts.
pub const POWER_PRECISION: i64 = 1000;

/// Properties the CSV query asks for, when the driver supports them.
pub const QUERY_PROPERTIES: &[&str] = &[
    "uuid",
    "name",
    "fan.speed",
    "pstate",
    "utilization.gpu",
    "utilization.memory",
    "memory.used",
    "memory.free",
    "memory.reserved",
    "temperature.gpu",
    "clocks.current.graphics",
    "clocks.current.video",
    "clocks.current.sm",
    "clocks.current.memory",
    "power.draw",
];

/// Readings of one GPU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuInfo {
    pub uuid: String,
    pub product_name: Option<String>,
    pub fan_speed: Option<f64>,
    /// `P0` (maximum performance) to `P15`.
    pub performance_state: Option<u8>,
    pub gpu_utilization: Option<f64>,
    pub mem_utilization: Option<f64>,
    pub fb_used_mib: Option<f64>,
    pub fb_free_mib: Option<f64>,
    pub fb_reserved_mib: Option<f64>,
    pub temperature: Option<f64>,
    pub graphics_clock: Option<f64>,
    pub video_clock: Option<f64>,
    pub sm_clock: Option<f64>,
    pub mem_clock: Option<f64>,
    pub power_draw: Option<f64>,
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value == "N/A" || value.starts_with('[')
}

/// Leading number of a reading, e.g. `30 %` or `8.70 W`.
fn number(value: &str) -> Option<f64> {
    let value = value.trim();
    if is_missing(value) {
        return None;
    }
    value.split_whitespace().next()?.parse().ok()
}

fn text(value: &str) -> Option<String> {
    let value = value.trim();
    (!is_missing(value)).then(|| value.to_string())
}

fn pstate(value: &str) -> Option<u8> {
    value
        .trim()
        .strip_prefix('P')?
        .parse()
        .ok()
        .filter(|n| *n <= 15)
}

/// Extracts the property names listed by `--help-query-gpu`.
///
/// Property lines start with the quoted name, optionally followed by
/// aliases: `"clocks.current.graphics" or "clocks.gr"`.
pub fn parse_help_query_gpu(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix('"')?;
            let (name, _) = rest.split_once('"')?;
            Some(name.to_string())
        })
        .collect()
}

/// Picks the [`QUERY_PROPERTIES`] the driver supports.
pub fn discover_properties(help: &[u8]) -> Result<Vec<String>, ParseError> {
    let supported = parse_help_query_gpu(help);
    let properties: Vec<String> = QUERY_PROPERTIES
        .iter()
        .filter(|p| supported.iter().any(|s| s == *p))
        .map(|p| p.to_string())
        .collect();
    if !properties.iter().any(|p| p == "uuid") {
        return Err(ParseError::new("'uuid' is not a supported query property"));
    }
    Ok(properties)
}

/// Decodes `--format=csv,nounits` output.
pub fn parse_csv(data: &[u8]) -> Result<Vec<GpuInfo>, ParseError> {
    let text_data = std::str::from_utf8(data)
        .map_err(|e| ParseError::new(format!("output is not valid UTF-8: {}", e)))?;
    let mut lines = text_data.lines().map(str::trim).filter(|l| !l.is_empty());

    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| ParseError::new("empty CSV output"))?
        .split(',')
        // `memory.used [MiB]` -> `memory.used`
        .map(|h| h.trim().split(" [").next().unwrap_or_default())
        .collect();
    if !header.contains(&"uuid") {
        return Err(ParseError::new("CSV header has no 'uuid' column"));
    }

    let mut gpus = Vec::new();
    for (idx, line) in lines.enumerate() {
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        if values.len() != header.len() {
            return Err(ParseError::new(format!(
                "row {}: {} values for {} columns",
                idx + 1,
                values.len(),
                header.len()
            )));
        }

        let mut gpu = GpuInfo::default();
        for (&property, &value) in header.iter().zip(&values) {
            match property {
                "uuid" => gpu.uuid = value.to_string(),
                "name" => gpu.product_name = text(value),
                "fan.speed" => gpu.fan_speed = number(value),
                "pstate" => gpu.performance_state = pstate(value),
                "utilization.gpu" => gpu.gpu_utilization = number(value),
                "utilization.memory" => gpu.mem_utilization = number(value),
                "memory.used" => gpu.fb_used_mib = number(value),
                "memory.free" => gpu.fb_free_mib = number(value),
                "memory.reserved" => gpu.fb_reserved_mib = number(value),
                "temperature.gpu" => gpu.temperature = number(value),
                "clocks.current.graphics" => gpu.graphics_clock = number(value),
                "clocks.current.video" => gpu.video_clock = number(value),
                "clocks.current.sm" => gpu.sm_clock = number(value),
                "clocks.current.memory" => gpu.mem_clock = number(value),
                "power.draw" => gpu.power_draw = number(value),
                _ => {}
            }
        }
        if is_missing(&gpu.uuid) {
            return Err(ParseError::new(format!("row {}: no GPU uuid", idx + 1)));
        }
        gpus.push(gpu);
    }
    Ok(gpus)
}

#[derive(Debug, Deserialize)]
struct XmlLog {
    #[serde(rename = "gpu", default)]
    gpus: Vec<XmlGpu>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlGpu {
    product_name: Option<String>,
    uuid: Option<String>,
    fan_speed: Option<String>,
    performance_state: Option<String>,
    fb_memory_usage: Option<XmlMemory>,
    utilization: Option<XmlUtilization>,
    temperature: Option<XmlTemperature>,
    power_readings: Option<XmlPower>,
    /// Newer drivers.
    gpu_power_readings: Option<XmlPower>,
    clocks: Option<XmlClocks>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlMemory {
    used: Option<String>,
    free: Option<String>,
    reserved: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlUtilization {
    gpu_util: Option<String>,
    memory_util: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlTemperature {
    gpu_temp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlPower {
    power_draw: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlClocks {
    graphics_clock: Option<String>,
    sm_clock: Option<String>,
    mem_clock: Option<String>,
    video_clock: Option<String>,
}

fn num(value: &Option<String>) -> Option<f64> {
    value.as_deref().and_then(number)
}

/// Decodes `-q -x` output. GPUs without a uuid are skipped.
pub fn parse_xml(data: &[u8]) -> Result<Vec<GpuInfo>, ParseError> {
    let xml = std::str::from_utf8(data)
        .map_err(|e| ParseError::new(format!("output is not valid UTF-8: {}", e)))?;
    let log: XmlLog = quick_xml::de::from_str(xml)
        .map_err(|e| ParseError::new(format!("invalid XML report: {}", e)))?;

    let gpus = log
        .gpus
        .into_iter()
        .filter_map(|g| {
            let uuid = g.uuid.as_deref().and_then(text)?;
            let memory = g.fb_memory_usage.unwrap_or_default();
            let utilization = g.utilization.unwrap_or_default();
            let clocks = g.clocks.unwrap_or_default();
            let power = g.power_readings.or(g.gpu_power_readings).unwrap_or_default();
            Some(GpuInfo {
                uuid,
                product_name: g.product_name.as_deref().and_then(text),
                fan_speed: num(&g.fan_speed),
                performance_state: g.performance_state.as_deref().and_then(pstate),
                gpu_utilization: num(&utilization.gpu_util),
                mem_utilization: num(&utilization.memory_util),
                fb_used_mib: num(&memory.used),
                fb_free_mib: num(&memory.free),
                fb_reserved_mib: num(&memory.reserved),
                temperature: g.temperature.and_then(|t| num(&t.gpu_temp)),
                graphics_clock: num(&clocks.graphics_clock),
                video_clock: num(&clocks.video_clock),
                sm_clock: num(&clocks.sm_clock),
                mem_clock: num(&clocks.mem_clock),
                power_draw: num(&power.power_draw),
            })
        })
        .collect();
    Ok(gpus)
}

/// Builds the snapshot. Every GPU with at least one reading is seen as a
/// [`EntityClass::Gpu`] keyed by its sanitized uuid and labeled with its
/// product name.
pub fn normalize(gpus: &[GpuInfo]) -> Normalized {
    let mut n = Normalized::new();

    for gpu in gpus {
        let id = sanitize_id(&gpu.uuid);
        let px = format!("gpu_{}_", id);
        let before = n.metrics.len();

        let mut set = |name: &str, value: Option<f64>, scale: f64| {
            if let Some(v) = value {
                n.set(format!("{}{}", px, name), (v * scale) as i64);
            }
        };
        set("fan_speed_perc", gpu.fan_speed, 1.0);
        set("gpu_utilization", gpu.gpu_utilization, 1.0);
        set("mem_utilization", gpu.mem_utilization, 1.0);
        set("frame_buffer_memory_usage_used", gpu.fb_used_mib, MIB);
        set("frame_buffer_memory_usage_free", gpu.fb_free_mib, MIB);
        set("frame_buffer_memory_usage_reserved", gpu.fb_reserved_mib, MIB);
        set("temperature", gpu.temperature, 1.0);
        set("graphics_clock", gpu.graphics_clock, 1.0);
        set("video_clock", gpu.video_clock, 1.0);
        set("sm_clock", gpu.sm_clock, 1.0);
        set("mem_clock", gpu.mem_clock, 1.0);
        set("power_draw", gpu.power_draw.map(|w| (w * POWER_PRECISION as f64).round()), 1.0);

        if let Some(state) = gpu.performance_state {
            for p in 0..=15u8 {
                n.set(format!("{}performance_state_P{}", px, p), i64::from(p == state));
            }
        }

        if n.metrics.len() > before {
            if let Some(name) = &gpu.product_name {
                n.label(EntityClass::Gpu, EntityId::new(id.clone()), "product_name", name.clone());
            }
            n.see(EntityClass::Gpu, EntityId::new(id));
        }
    }
    n
}
