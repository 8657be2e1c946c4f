//! Fiscal and AP period types consumed by the posting gate.

pub mod period;

pub use period::{FiscalPeriod, PeriodState};
