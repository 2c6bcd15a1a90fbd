use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use std::time::Duration;

use crate::{
    error::ProviderFailure,
    model::{Credential, RawObservation},
};

use super::WeatherClient;

#[derive(Debug, Clone)]
pub struct WeatherstackClient {
    http: Client,
    endpoint: String,
}

impl WeatherstackClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Weatherstack")?;

        Ok(Self { http, endpoint: format!("{}/current", base_url.trim_end_matches('/')) })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The GET sent for one location: `<base>/current?access_key=..&query=..&units=..`.
    pub fn request(
        &self,
        location: &str,
        credential: &Credential,
        provider_code: &str,
    ) -> reqwest::Result<Request> {
        self.http
            .get(&self.endpoint)
            .query(&[
                ("access_key", credential.expose()),
                ("query", location),
                ("units", provider_code),
            ])
            .build()
    }
}

#[async_trait]
impl WeatherClient for WeatherstackClient {
    async fn fetch(
        &self,
        location: &str,
        credential: &Credential,
        provider_code: &str,
    ) -> Result<RawObservation, ProviderFailure> {
        let req = self.request(location, credential, provider_code).map_err(network_failure)?;
        let res = self.http.execute(req).await.map_err(network_failure)?;

        let status = res.status();
        let body = res.text().await.map_err(network_failure)?;

        classify_response(status, &body)
    }
}

/// Sort a Weatherstack reply into an observation or a typed failure.
///
/// Weatherstack reports most errors (bad key, quota, unknown location) with
/// HTTP 200 and an `error` object, so the body is checked even on success.
pub fn classify_response(
    status: StatusCode,
    body: &str,
) -> Result<RawObservation, ProviderFailure> {
    if !status.is_success() {
        let error = serde_json::from_str::<RawObservation>(body).ok().and_then(|r| r.error);
        let code = error.as_ref().and_then(|e| e.code);
        let info = error
            .and_then(|e| e.info)
            .unwrap_or_else(|| format!("HTTP {status}: {}", truncate_body(body)));
        return Err(ProviderFailure::Provider { code, info });
    }

    if body.trim().is_empty() {
        return Err(ProviderFailure::EmptyResponse);
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProviderFailure::MalformedResponse(e.to_string()))?;

    if value.is_null() {
        return Err(ProviderFailure::EmptyResponse);
    }
    if !value.is_object() {
        return Err(ProviderFailure::MalformedResponse(format!(
            "expected a JSON object, got: {}",
            truncate_body(body)
        )));
    }

    let raw: RawObservation = serde_json::from_value(value)
        .map_err(|e| ProviderFailure::MalformedResponse(e.to_string()))?;

    if raw.current.is_none() {
        if let Some(error) = &raw.error {
            let info = error
                .info
                .clone()
                .or_else(|| error.kind.clone())
                .unwrap_or_else(|| "unknown provider error".to_string());
            return Err(ProviderFailure::Provider { code: error.code, info });
        }
    }

    Ok(raw)
}

// reqwest errors carry the request URL, and the URL carries the access key.
fn network_failure(err: reqwest::Error) -> ProviderFailure {
    ProviderFailure::Network(err.without_url().to_string())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn endpoint_is_built_from_base_url() {
        let client = WeatherstackClient::new("http://localhost:9999/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(client.endpoint(), "http://localhost:9999/current");
    }

    #[test]
    fn request_carries_key_location_and_units() {
        let client = WeatherstackClient::new("http://api.example.test", Duration::from_secs(1))
            .expect("client");

        let req = client
            .request("San Jose", &Credential::new("KEY123"), "m")
            .expect("request");

        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.url().host_str(), Some("api.example.test"));
        assert_eq!(req.url().path(), "/current");

        let query: Vec<(String, String)> = req
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            vec![
                ("access_key".to_string(), "KEY123".to_string()),
                ("query".to_string(), "San Jose".to_string()),
                ("units".to_string(), "m".to_string()),
            ]
        );
    }

    #[test]
    fn success_body_becomes_observation() {
        let body = r#"{"current": {"temperature": 12, "humidity": 80, "wind_speed": 9,
            "pressure": 1020, "weather_descriptions": ["Light rain"]}}"#;

        let raw = classify_response(StatusCode::OK, body).expect("observation");
        assert_eq!(raw.current.and_then(|c| c.temperature), Some(12.0));
    }

    #[test]
    fn fractional_humidity_still_yields_observation() {
        let body = r#"{"current": {"temperature": 10, "humidity": 65.0, "wind_speed": 4,
            "pressure": 1015, "weather_descriptions": ["Mist"]}}"#;

        let current = classify_response(StatusCode::OK, body)
            .expect("observation")
            .current
            .expect("current");
        assert_eq!(current.humidity, Some(65));
        assert_eq!(current.temperature, Some(10.0));
    }

    #[test]
    fn body_without_current_passes_through() {
        let body = r#"{"request": {"type": "City", "query": "Atlantis"}}"#;

        let raw = classify_response(StatusCode::OK, body).expect("observation");
        assert!(raw.current.is_none());
    }

    #[test]
    fn error_object_is_provider_error() {
        let body = r#"{"success": false, "error": {"code": 104, "type": "usage_limit_reached",
            "info": "Your monthly usage limit has been reached."}}"#;

        let err = classify_response(StatusCode::OK, body).unwrap_err();
        assert_eq!(
            err,
            ProviderFailure::Provider {
                code: Some(104),
                info: "Your monthly usage limit has been reached.".into(),
            }
        );
        assert_eq!(err.code(), "provider_error");
    }

    #[test]
    fn error_object_without_info_uses_type() {
        let body = r#"{"success": false, "error": {"code": 101, "type": "invalid_access_key"}}"#;

        let err = classify_response(StatusCode::OK, body).unwrap_err();
        assert_eq!(
            err,
            ProviderFailure::Provider { code: Some(101), info: "invalid_access_key".into() }
        );
    }

    #[test]
    fn non_2xx_is_provider_error_with_status() {
        let err =
            classify_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        match err {
            ProviderFailure::Provider { code, info } => {
                assert_eq!(code, None);
                assert!(info.contains("502"));
                assert!(info.contains("bad gateway"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn non_2xx_prefers_error_info() {
        let body = r#"{"error": {"code": 601, "info": "Please specify a valid location."}}"#;

        let err = classify_response(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert_eq!(
            err,
            ProviderFailure::Provider {
                code: Some(601),
                info: "Please specify a valid location.".into(),
            }
        );
    }

    #[test]
    fn blank_and_null_bodies_are_empty_responses() {
        assert_eq!(
            classify_response(StatusCode::OK, "").unwrap_err(),
            ProviderFailure::EmptyResponse
        );
        assert_eq!(
            classify_response(StatusCode::OK, "  \n").unwrap_err(),
            ProviderFailure::EmptyResponse
        );
        assert_eq!(
            classify_response(StatusCode::OK, "null").unwrap_err(),
            ProviderFailure::EmptyResponse
        );
    }

    #[test]
    fn malformed_bodies() {
        let err = classify_response(StatusCode::OK, "{not json").unwrap_err();
        assert_eq!(err.code(), "malformed_response");

        let err = classify_response(StatusCode::OK, "[1, 2, 3]").unwrap_err();
        assert_eq!(err.code(), "malformed_response");

        let body = r#"{"current": {"temperature": "warm"}}"#;
        let err = classify_response(StatusCode::OK, body).unwrap_err();
        assert_eq!(err.code(), "malformed_response");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error_without_key() {
        let client = WeatherstackClient::new("http://127.0.0.1:1", Duration::from_secs(2))
            .expect("client");

        let err = client
            .fetch("Boston", &Credential::new("SECRET_KEY"), "f")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "network_error");
        assert!(!err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "°".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }
}
