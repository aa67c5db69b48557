//! EV fleet charging cost simulator for day-ahead and intraday markets.

pub mod config;
pub mod error;
/// Fleet population: vehicles, probability distributions, generator.
pub mod fleet;
pub mod io;
/// Market price series, CSV ingestion, and synthetic curves.
pub mod market;
pub mod runner;
/// Demand projection, market allocation, cost accounting, and reporting.
pub mod sim;
