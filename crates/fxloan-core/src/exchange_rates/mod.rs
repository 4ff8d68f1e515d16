//! Exchange-rate observations: bucketing, aggregation, trend forecast and
//! the summary statistics a rate dashboard displays.

pub mod aggregation;
pub mod dashboard;
pub mod forecast;
pub mod observation;
pub mod statistics;
pub mod timeframe;
