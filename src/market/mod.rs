//! Market price data: series storage, CSV ingestion, synthetic curves.

pub mod loader;
pub mod series;
pub mod synthetic;

pub use loader::load_price_series;
pub use series::{MarketData, PriceSeries, SlotPrices};
pub use synthetic::PriceCurve;
