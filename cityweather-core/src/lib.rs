//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Unit selection and its provider code / display labels
//! - The weather client abstraction (Weatherstack, offline sample data)
//! - Extraction of provider bodies into uniform table rows
//! - A fixed-delay rate limiter
//! - The aggregator that ties them together, tolerating per-location failures
//! - Configuration & credential handling
//! - Optional AI condition summary and advisories over a loaded table
//!
//! It is used by `cityweather-cli`, but can be driven by any other front end:
//! build an [`Aggregator`] and call [`Aggregator::run`] once per user action.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod insights;
pub mod model;
pub mod provider;
pub mod rate_limit;
pub mod units;

pub use aggregate::Aggregator;
pub use config::{Config, DEFAULT_LOCATIONS};
pub use error::{ConfigError, ExtractionFailure, InsightsError, ProviderFailure};
pub use extract::extract;
pub use insights::{Advisor, Advisory, Insights};
pub use model::{
    AggregationResult, Credential, Failure, FailureReason, RawObservation, RunStatus,
    WeatherRecord,
};
pub use provider::{ProviderId, WeatherClient, client_from_config};
pub use rate_limit::{FixedDelay, NoDelay, RateLimiter};
pub use units::{UnitLabels, UnitSelection};
