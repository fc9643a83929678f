//! Fish growth and feed consumption forecasting.
//!
//! The core is a day-by-day Specific Growth Rate projection per tank, with
//! feed and feeding rate resolved each day from either a 1-D feeding curve or
//! a 2-D temperature x weight matrix, aggregated farm-wide into per-feed-type
//! consumption forecasts with stockout and reorder timing.

pub mod config;
pub mod forecast;
pub mod growth;
pub mod output;
pub mod rates;
pub mod repository;
pub mod selector;
