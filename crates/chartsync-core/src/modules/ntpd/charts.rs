//! Chart catalog of the ntpd module.
//!
//! All values are collected multiplied by [`PRECISION`]; dimensions divide it
//! back out.

use crate::charts::{ChartChange, ChartTemplate, ChartType, DimTemplate, IdTemplate};
use crate::collector::{EntityCharts, EntityClass, EntityId, Snapshot, add_backed_charts};
use crate::error::MaterializeError;

use super::collect::SYSTEM_FAMILY;

pub const PRECISION: i64 = 1_000_000;

const PRIO_SYSTEM: u32 = 1000;
const PRIO_PEERS: u32 = 1100;

const fn sys(id: &'static str, name: &'static str) -> DimTemplate {
    DimTemplate::absolute(IdTemplate::fixed(id), name).with_div(PRECISION)
}

const fn peer(id: &'static str, name: &'static str) -> DimTemplate {
    DimTemplate::absolute(IdTemplate::new(id, 1), name).with_div(PRECISION)
}

const fn system_chart(
    id: &'static str,
    title: &'static str,
    units: &'static str,
    context: &'static str,
    priority: u32,
    dims: &'static [DimTemplate],
) -> ChartTemplate {
    ChartTemplate {
        id: IdTemplate::fixed(id),
        title,
        units,
        family: "system",
        context,
        chart_type: ChartType::Line,
        priority,
        dims,
        vars: &[],
    }
}

const fn peer_chart(
    id: &'static str,
    title: &'static str,
    units: &'static str,
    context: &'static str,
    priority: u32,
    dims: &'static [DimTemplate],
) -> ChartTemplate {
    ChartTemplate {
        id: IdTemplate::new(id, 1),
        title,
        units,
        family: "peers",
        context,
        chart_type: ChartType::Line,
        priority,
        dims,
        vars: &[],
    }
}

const SYSTEM_CHARTS: &[ChartTemplate] = &[
    system_chart(
        "sys_offset",
        "Combined offset of server relative to this host",
        "milliseconds",
        "ntpd.sys_offset",
        PRIO_SYSTEM,
        &[sys("offset", "offset")],
    ),
    system_chart(
        "sys_jitter",
        "Combined system jitter and clock jitter",
        "milliseconds",
        "ntpd.sys_jitter",
        PRIO_SYSTEM + 1,
        &[sys("sys_jitter", "system"), sys("clk_jitter", "clock")],
    ),
    system_chart(
        "sys_frequency",
        "Frequency offset relative to hardware clock",
        "ppm",
        "ntpd.sys_frequency",
        PRIO_SYSTEM + 2,
        &[sys("frequency", "frequency")],
    ),
    system_chart(
        "sys_wander",
        "Clock frequency wander",
        "ppm",
        "ntpd.sys_wander",
        PRIO_SYSTEM + 3,
        &[sys("clk_wander", "clock")],
    ),
    system_chart(
        "sys_rootdelay",
        "Total roundtrip delay to the primary reference clock",
        "milliseconds",
        "ntpd.sys_rootdelay",
        PRIO_SYSTEM + 4,
        &[sys("rootdelay", "delay")],
    ),
    system_chart(
        "sys_rootdisp",
        "Total root dispersion to the primary reference clock",
        "milliseconds",
        "ntpd.sys_rootdisp",
        PRIO_SYSTEM + 5,
        &[sys("rootdisp", "dispersion")],
    ),
    system_chart(
        "sys_stratum",
        "Stratum",
        "stratum",
        "ntpd.sys_stratum",
        PRIO_SYSTEM + 6,
        &[sys("stratum", "stratum")],
    ),
    system_chart(
        "sys_tc",
        "Time constant and poll exponent",
        "log2",
        "ntpd.sys_tc",
        PRIO_SYSTEM + 7,
        &[sys("tc", "current"), sys("mintc", "minimum")],
    ),
    system_chart(
        "sys_precision",
        "Precision",
        "log2",
        "ntpd.sys_precision",
        PRIO_SYSTEM + 8,
        &[sys("precision", "precision")],
    ),
];

const PEER_CHARTS: &[ChartTemplate] = &[
    peer_chart(
        "peer_{0}_offset",
        "Peer offset",
        "milliseconds",
        "ntpd.peer_offset",
        PRIO_PEERS,
        &[peer("peer_{0}_offset", "offset")],
    ),
    peer_chart(
        "peer_{0}_delay",
        "Peer delay",
        "milliseconds",
        "ntpd.peer_delay",
        PRIO_PEERS + 1,
        &[peer("peer_{0}_delay", "delay")],
    ),
    peer_chart(
        "peer_{0}_dispersion",
        "Peer dispersion",
        "milliseconds",
        "ntpd.peer_dispersion",
        PRIO_PEERS + 2,
        &[peer("peer_{0}_dispersion", "dispersion")],
    ),
    peer_chart(
        "peer_{0}_jitter",
        "Peer jitter",
        "milliseconds",
        "ntpd.peer_jitter",
        PRIO_PEERS + 3,
        &[peer("peer_{0}_jitter", "jitter")],
    ),
    peer_chart(
        "peer_{0}_xleave",
        "Peer interleave delay",
        "milliseconds",
        "ntpd.peer_xleave",
        PRIO_PEERS + 4,
        &[peer("peer_{0}_xleave", "xleave")],
    ),
    peer_chart(
        "peer_{0}_rootdelay",
        "Peer roundtrip delay to the primary reference clock",
        "milliseconds",
        "ntpd.peer_rootdelay",
        PRIO_PEERS + 5,
        &[peer("peer_{0}_rootdelay", "rootdelay")],
    ),
    peer_chart(
        "peer_{0}_rootdisp",
        "Peer root dispersion to the primary reference clock",
        "milliseconds",
        "ntpd.peer_rootdisp",
        PRIO_PEERS + 6,
        &[peer("peer_{0}_rootdisp", "dispersion")],
    ),
    peer_chart(
        "peer_{0}_stratum",
        "Peer stratum",
        "stratum",
        "ntpd.peer_stratum",
        PRIO_PEERS + 7,
        &[peer("peer_{0}_stratum", "stratum")],
    ),
    peer_chart(
        "peer_{0}_tc",
        "Peer time constant",
        "log2",
        "ntpd.peer_tc",
        PRIO_PEERS + 8,
        &[peer("peer_{0}_hpoll", "host"), peer("peer_{0}_ppoll", "peer")],
    ),
    peer_chart(
        "peer_{0}_precision",
        "Peer precision",
        "log2",
        "ntpd.peer_precision",
        PRIO_PEERS + 9,
        &[peer("peer_{0}_precision", "precision")],
    ),
];

/// Entity classes of the ntpd module: the system family and peers.
pub struct NtpdCharts;

impl EntityCharts for NtpdCharts {
    fn plan(
        &self,
        class: EntityClass,
        id: &EntityId,
        metrics: &Snapshot,
    ) -> Result<Vec<ChartChange>, MaterializeError> {
        match class {
            // Older daemons do not report every variable (e.g. `mintc`).
            EntityClass::Family if id.parts().first().map(String::as_str) == Some(SYSTEM_FAMILY) => {
                add_backed_charts::<&str>(SYSTEM_CHARTS, &[], metrics)
            }
            EntityClass::Peer => add_backed_charts(PEER_CHARTS, id.parts(), metrics),
            other => Err(MaterializeError::UnsupportedClass(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::instantiate_all;

    #[test]
    fn test_templates_render() {
        assert_eq!(instantiate_all::<&str>(SYSTEM_CHARTS, &[]).unwrap().len(), 9);
        let charts = instantiate_all(PEER_CHARTS, &["10_0_0_1"]).unwrap();
        assert_eq!(charts[0].id, "peer_10_0_0_1_offset");
        assert_eq!(charts[0].dims[0].id, "peer_10_0_0_1_offset");
        assert_eq!(charts[0].dims[0].div, PRECISION);
    }

    #[test]
    fn test_plan_rejects_foreign_classes() {
        let mx = Snapshot::new();
        assert!(NtpdCharts.plan(EntityClass::Gpu, &EntityId::new("x"), &mx).is_err());
        assert!(NtpdCharts.plan(EntityClass::Family, &EntityId::new("cpu"), &mx).is_err());
    }

    #[test]
    fn test_system_charts_follow_collected_vars() {
        let mx: Snapshot = [("offset", 1), ("tc", 10_000_000)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let changes = NtpdCharts
            .plan(EntityClass::Family, &EntityId::new(SYSTEM_FAMILY), &mx)
            .unwrap();
        // sys_tc needs mintc as well.
        let added: Vec<_> = changes
            .iter()
            .filter(|c| matches!(c, ChartChange::AddChart(_)))
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(changes.len(), SYSTEM_CHARTS.len());
    }
}
