use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{
    error::{ExtractionFailure, ProviderFailure},
    units::UnitLabels,
};

/// API access key. Never printed, never logged.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Provider body for one location, as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(default)]
    pub current: Option<RawCurrent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderErrorBody>,
}

/// `current` section. Only `temperature` is strictly typed; the optional
/// numeric fields accept any JSON number (or numeric string) and become
/// `None` otherwise, so one odd field does not sink the whole observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCurrent {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub humidity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub pressure: Option<i64>,
    #[serde(default)]
    pub weather_descriptions: Option<Vec<String>>,
}

fn lenient_float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

// Fractional values are truncated.
fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = lenient_float(d)?;
    Ok(value.filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

/// The `error` object Weatherstack sends instead of `current`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

/// One normalized table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub temperature: f64,
    pub humidity: i64,
    pub wind_speed: f64,
    pub pressure: i64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Empty,
    Partial,
    Complete,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Empty => "empty",
            RunStatus::Partial => "partial",
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a location (or the whole run) produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    MissingCredential,
    EmptyLocation,
    Provider(ProviderFailure),
    Extraction(ExtractionFailure),
}

impl FailureReason {
    /// Stable machine-readable reason, e.g. `missing_current`.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::MissingCredential => "missing_credential",
            FailureReason::EmptyLocation => "empty_location",
            FailureReason::Provider(p) => p.code(),
            FailureReason::Extraction(e) => e.code(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingCredential => f.write_str("API key is missing"),
            FailureReason::EmptyLocation => f.write_str("location name is empty"),
            FailureReason::Provider(p) => write!(f, "{p}"),
            FailureReason::Extraction(e) => write!(f, "{e}"),
        }
    }
}

impl From<ProviderFailure> for FailureReason {
    fn from(value: ProviderFailure) -> Self {
        FailureReason::Provider(value)
    }
}

impl From<ExtractionFailure> for FailureReason {
    fn from(value: ExtractionFailure) -> Self {
        FailureReason::Extraction(value)
    }
}

/// A recorded failure. `location` is `None` for failures that stopped the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub location: Option<String>,
    pub reason: FailureReason,
}

impl Failure {
    pub fn for_location(location: impl Into<String>, reason: impl Into<FailureReason>) -> Self {
        Self { location: Some(location.into()), reason: reason.into() }
    }

    pub fn for_run(reason: FailureReason) -> Self {
        Self { location: None, reason }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {} ({})", self.reason, self.reason.code()),
            None => write!(f, "{} ({})", self.reason, self.reason.code()),
        }
    }
}

/// Output of one run: successful rows in request order plus what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub records: Vec<WeatherRecord>,
    pub status: RunStatus,
    pub failures: Vec<Failure>,
    pub units: UnitLabels,
    pub requested: usize,
}

impl AggregationResult {
    pub fn failure_codes(&self) -> Vec<(Option<&str>, &'static str)> {
        self.failures.iter().map(|f| (f.location.as_deref(), f.reason.code())).collect()
    }

    /// One-line status message for display.
    pub fn summary(&self) -> String {
        match self.status {
            RunStatus::Empty => "No locations selected.".to_string(),
            RunStatus::Complete | RunStatus::Partial => format!(
                "Loaded current weather for {} of {} location(s).",
                self.records.len(),
                self.requested
            ),
            RunStatus::Failed => {
                let detail = self
                    .failures
                    .first()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "no data returned".to_string());
                format!("Could not load weather for any location: {detail}")
            }
        }
    }
}
