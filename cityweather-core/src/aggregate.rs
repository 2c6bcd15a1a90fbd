use tracing::{debug, info, warn};

use crate::{
    extract::extract,
    model::{AggregationResult, Credential, Failure, FailureReason, RunStatus},
    provider::WeatherClient,
    rate_limit::RateLimiter,
    units::{UnitSelection, resolve},
};

/// Runs one client over a list of locations, strictly one request at a time.
///
/// A failing location is recorded and skipped; it never aborts the run.
/// Callers wanting to stop early must do so between runs: there is no
/// cancellation inside a run.
pub struct Aggregator {
    client: Box<dyn WeatherClient>,
    limiter: Box<dyn RateLimiter>,
}

impl Aggregator {
    pub fn new(client: Box<dyn WeatherClient>, limiter: Box<dyn RateLimiter>) -> Self {
        Self { client, limiter }
    }

    pub async fn run<S: AsRef<str>>(
        &self,
        locations: &[S],
        selection: UnitSelection,
        credential: Option<&Credential>,
    ) -> AggregationResult {
        let units = resolve(selection);
        let requested = locations.len();

        if locations.is_empty() {
            debug!("no locations requested");
            return AggregationResult {
                records: Vec::new(),
                status: RunStatus::Empty,
                failures: Vec::new(),
                units,
                requested,
            };
        }

        let Some(credential) = credential.filter(|c| !c.is_empty()) else {
            warn!("no API key available, skipping all requests");
            return AggregationResult {
                records: Vec::new(),
                status: RunStatus::Failed,
                failures: vec![Failure::for_run(FailureReason::MissingCredential)],
                units,
                requested,
            };
        };

        info!(locations = requested, units = %selection, "fetching current weather");

        let mut records = Vec::with_capacity(requested);
        let mut failures = Vec::new();
        let mut sent = 0usize;

        for (index, entry) in locations.iter().enumerate() {
            let location = entry.as_ref().trim();
            if location.is_empty() {
                // Name the entry by position since there is no name to show.
                let label = format!("#{} ({:?})", index + 1, entry.as_ref());
                warn!(entry = %label, "skipping blank location");
                failures.push(Failure::for_location(label, FailureReason::EmptyLocation));
                continue;
            }

            if sent > 0 {
                self.limiter.wait().await;
            }
            sent += 1;

            let raw = match self.client.fetch(location, credential, units.provider_code).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(location, reason = e.code(), "request failed: {e}");
                    failures.push(Failure::for_location(location, e));
                    continue;
                }
            };

            match extract(location, &raw) {
                Ok(record) => {
                    debug!(location, temperature = record.temperature, "got observation");
                    records.push(record);
                }
                Err(e) => {
                    warn!(location, reason = e.code(), "unusable observation: {e}");
                    failures.push(Failure::for_location(location, e));
                }
            }
        }

        let status = if records.is_empty() {
            RunStatus::Failed
        } else if records.len() == requested {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        };

        info!(ok = records.len(), failed = failures.len(), %status, "weather run finished");

        AggregationResult { records, status, failures, units, requested }
    }
}
