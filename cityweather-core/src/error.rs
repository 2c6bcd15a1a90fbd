use thiserror::Error;

/// Problems with the run's inputs, detected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "No API key configured.\n\
         Hint: set WEATHER_API_KEY or run `cityweather configure`."
    )]
    MissingCredential,

    #[error(
        "Unknown unit selection '{0}'. \
         Supported units: f (imperial), m (metric), s (scientific)."
    )]
    UnknownUnits(String),

    #[error("Unknown provider '{0}'. Supported providers: weatherstack, sample.")]
    UnknownProvider(String),
}

/// A request for one location that never produced a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider error{}: {info}", .code.map(|c| format!(" {c}")).unwrap_or_default())]
    Provider { code: Option<i64>, info: String },

    #[error("empty response from provider")]
    EmptyResponse,
}

impl ProviderFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ProviderFailure::Network(_) => "network_error",
            ProviderFailure::MalformedResponse(_) => "malformed_response",
            ProviderFailure::Provider { .. } => "provider_error",
            ProviderFailure::EmptyResponse => "empty_response",
        }
    }
}

/// A provider body that parsed but cannot be turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("response has no current conditions")]
    MissingCurrent,

    #[error("current conditions have no temperature")]
    MissingTemperature,
}

impl ExtractionFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionFailure::MissingCurrent => "missing_current",
            ExtractionFailure::MissingTemperature => "missing_temperature",
        }
    }
}

/// Insight generation could not start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsightsError {
    #[error("No weather data to analyze.")]
    NoData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failure_codes_are_distinct() {
        let failures = [
            ProviderFailure::Network("timed out".into()),
            ProviderFailure::MalformedResponse("eof".into()),
            ProviderFailure::Provider { code: Some(615), info: "nope".into() },
            ProviderFailure::EmptyResponse,
        ];

        let codes: Vec<_> = failures.iter().map(|f| f.code()).collect();
        assert_eq!(
            codes,
            vec!["network_error", "malformed_response", "provider_error", "empty_response"]
        );
    }

    #[test]
    fn provider_error_message_includes_code_when_known() {
        let with_code = ProviderFailure::Provider { code: Some(104), info: "quota".into() };
        assert_eq!(with_code.to_string(), "provider error 104: quota");

        let without_code = ProviderFailure::Provider { code: None, info: "HTTP 500".into() };
        assert_eq!(without_code.to_string(), "provider error: HTTP 500");
    }

    #[test]
    fn missing_credential_has_hint() {
        let msg = ConfigError::MissingCredential.to_string();
        assert!(msg.contains("WEATHER_API_KEY"));
        assert!(msg.contains("cityweather configure"));
    }
}
