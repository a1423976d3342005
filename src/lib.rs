//! Risk-aware dispatch decisioning for last-mile delivery operations.
//!
//! The crate centers on the [`dispatch`] module: shipment intake, four
//! independent feasibility scorers, composite risk scoring against a tunable
//! weight store, a threshold-based decision gate, accountable human overrides,
//! and a daily learning loop that adjusts scoring weights from observed
//! delivery outcomes. Storage, notification transport, and the weather data
//! provider stay behind traits so the core remains testable in isolation.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod telemetry;
