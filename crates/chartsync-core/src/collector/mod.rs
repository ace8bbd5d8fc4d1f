//! Entity discovery and chart-lifecycle synchronization engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CycleController                        │
//! │                                                              │
//! │  fetch ──► normalize ──► Normalized { metrics, seen }        │
//! │  (source)  (module)                    │                     │
//! │                                        ▼                     │
//! │                              ┌───────────────────┐           │
//! │   EntityRegistry ◄─────────► │ ChartSynchronizer │           │
//! │   (append-only)              └─────────┬─────────┘           │
//! │                                        │ EntityCharts::plan  │
//! │                                        ▼                     │
//! │                                    ChartSet                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use chartsync_core::collector::{CycleController, EntityCharts, EntityClass,
//!     EntityId, Normalized, Snapshot, add_charts};
//! use chartsync_core::charts::{ChartChange, ChartTemplate, ChartType, DimTemplate, IdTemplate};
//! use chartsync_core::error::MaterializeError;
//!
//! const NIC_CHARTS: &[ChartTemplate] = &[ChartTemplate {
//!     id: IdTemplate::new("nic_{0}_bandwidth", 1),
//!     title: "Bandwidth",
//!     units: "bytes/s",
//!     family: "net",
//!     context: "demo.nic_bandwidth",
//!     chart_type: ChartType::Area,
//!     priority: 1,
//!     dims: &[DimTemplate::incremental(IdTemplate::new("nic_{0}_received", 1), "received")],
//!     vars: &[],
//! }];
//!
//! struct NicCharts;
//!
//! impl EntityCharts for NicCharts {
//!     fn plan(&self, class: EntityClass, id: &EntityId, _: &Snapshot)
//!         -> Result<Vec<ChartChange>, MaterializeError> {
//!         match class {
//!             EntityClass::Nic => add_charts(NIC_CHARTS, id.parts()),
//!             other => Err(MaterializeError::UnsupportedClass(other)),
//!         }
//!     }
//! }
//!
//! let mut controller = CycleController::new();
//! let mx = controller.run_cycle(&NicCharts, || Ok(42), |bytes| {
//!     let mut n = Normalized::new();
//!     n.set("nic_eth0_received", bytes);
//!     n.see(EntityClass::Nic, EntityId::new("eth0"));
//!     Ok(n)
//! }).unwrap();
//!
//! assert_eq!(mx["nic_eth0_received"], 42);
//! assert!(controller.charts().has_chart("nic_eth0_bandwidth"));
//! ```

mod cycle;
mod registry;
mod sync;
mod traits;

pub use cycle::{CycleController, CycleTiming};
pub use registry::{EntityClass, EntityId, EntityLabels, EntityRegistry, Progress, SeenSet};
pub use sync::{ChartSynchronizer, SyncReport, add_backed_charts, add_charts};
pub use traits::{EntityCharts, Module, Normalized, Snapshot};
