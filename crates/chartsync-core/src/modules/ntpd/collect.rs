//! Turns ntpd variables into metrics.

use crate::charts::sanitize_id;
use crate::collector::{EntityClass, EntityId, Normalized};

use super::charts::PRECISION;
use super::client::Vars;

/// Entity id of the system variables family.
pub const SYSTEM_FAMILY: &str = "system";

pub const SYSTEM_VARS: &[&str] = &[
    "offset",
    "sys_jitter",
    "clk_jitter",
    "frequency",
    "clk_wander",
    "rootdelay",
    "rootdisp",
    "stratum",
    "tc",
    "mintc",
    "precision",
];

pub const PEER_VARS: &[&str] = &[
    "offset",
    "delay",
    "dispersion",
    "jitter",
    "xleave",
    "rootdelay",
    "rootdisp",
    "stratum",
    "hpoll",
    "ppoll",
    "precision",
];

/// Variables gathered in one cycle.
#[derive(Debug, Clone, Default)]
pub struct NtpSample {
    pub system: Vars,
    pub peers: Vec<Vars>,
}

/// Scales every known numeric variable by [`PRECISION`].
///
/// Peers are keyed by their source address; peers without one, or with the
/// unspecified address `0.0.0.0`, are skipped. Non-numeric values are left
/// out of the snapshot.
pub fn normalize(sample: &NtpSample) -> Normalized {
    let mut n = Normalized::new();

    let mut has_system = false;
    for &name in SYSTEM_VARS {
        if let Some(v) = scaled(&sample.system, name) {
            n.set(name, v);
            has_system = true;
        }
    }
    if has_system {
        n.see(EntityClass::Family, EntityId::new(SYSTEM_FAMILY));
    }

    for vars in &sample.peers {
        let Some(addr) = vars.get("srcadr").map(|a| a.trim()) else {
            continue;
        };
        if addr.is_empty() || addr == "0.0.0.0" {
            continue;
        }
        let peer = sanitize_id(addr);

        let mut has_values = false;
        for &name in PEER_VARS {
            if let Some(v) = scaled(vars, name) {
                n.set(format!("peer_{}_{}", peer, name), v);
                has_values = true;
            }
        }
        if has_values {
            n.see(EntityClass::Peer, EntityId::new(peer));
        }
    }
    n
}

fn scaled(vars: &Vars, name: &str) -> Option<i64> {
    let v: f64 = vars.get(name)?.trim().parse().ok()?;
    v.is_finite().then(|| (v * PRECISION as f64).round() as i64)
}
