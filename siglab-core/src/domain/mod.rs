//! Domain types for SigLab

pub mod bar;
pub mod series;
pub mod trade;

pub use bar::Bar;
pub use series::{bars_from_closes, Series, SeriesError};
pub use trade::{CrossDirection, TradeRecord};
