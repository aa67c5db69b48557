//! Fleet population components.

/// Stochastic fleet population generator.
pub mod generator;
/// Probability mass functions for arrival, departure, and return SOC.
pub mod pmf;
pub mod vehicle;

pub use generator::FleetGenerator;
pub use pmf::{SocPmf, TimePmf};
pub use vehicle::{ChargeRecord, Fleet, IdmMarket, Vehicle};
