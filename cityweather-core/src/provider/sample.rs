//! Offline provider with canned conditions for the default cities.
//!
//! Useful when the provider's free-tier quota is exhausted or for demos.

use async_trait::async_trait;

use crate::{
    error::ProviderFailure,
    model::{Credential, RawCurrent, RawObservation},
    units::UnitSelection,
};

use super::WeatherClient;

struct SampleRow {
    location: &'static str,
    temperature_f: f64,
    humidity: i64,
    wind_mph: f64,
    pressure: i64,
    description: &'static str,
}

const fn row(
    location: &'static str,
    temperature_f: f64,
    humidity: i64,
    wind_mph: f64,
    pressure: i64,
    description: &'static str,
) -> SampleRow {
    SampleRow { location, temperature_f, humidity, wind_mph, pressure, description }
}

// location, °F, humidity %, mph, mb, conditions
const SAMPLE_ROWS: &[SampleRow] = &[
    row("New York", 42.0, 65, 12.0, 1015, "Partly cloudy"),
    row("Los Angeles", 68.0, 55, 5.0, 1012, "Clear"),
    row("Chicago", 35.0, 70, 15.0, 1018, "Overcast"),
    row("Houston", 58.0, 78, 8.0, 1014, "Light rain"),
    row("Phoenix", 75.0, 25, 6.0, 1010, "Sunny"),
    row("Philadelphia", 45.0, 62, 10.0, 1016, "Partly cloudy"),
    row("Seattle", 48.0, 82, 7.0, 1013, "Light drizzle"),
    row("San Diego", 66.0, 58, 9.0, 1012, "Clear"),
    row("Boston", 38.0, 68, 14.0, 1017, "Partly cloudy"),
    row("San Jose", 62.0, 52, 4.0, 1013, "Clear"),
];

const KMH_PER_MPH: f64 = 1.609_344;

#[derive(Debug, Clone, Default)]
pub struct SampleClient;

impl SampleClient {
    pub fn new() -> Self {
        Self
    }

    pub fn locations() -> impl Iterator<Item = &'static str> {
        SAMPLE_ROWS.iter().map(|r| r.location)
    }
}

#[async_trait]
impl WeatherClient for SampleClient {
    async fn fetch(
        &self,
        location: &str,
        _credential: &Credential,
        provider_code: &str,
    ) -> Result<RawObservation, ProviderFailure> {
        let units = UnitSelection::try_from(provider_code).map_err(|e| ProviderFailure::Provider {
            code: None,
            info: e.to_string(),
        })?;

        let Some(row) = SAMPLE_ROWS.iter().find(|r| r.location.eq_ignore_ascii_case(location))
        else {
            return Ok(RawObservation::default());
        };

        Ok(RawObservation { current: Some(row.to_current(units)), ..Default::default() })
    }
}

impl SampleRow {
    fn to_current(&self, units: UnitSelection) -> RawCurrent {
        let celsius = (self.temperature_f - 32.0) * 5.0 / 9.0;
        let (temperature, wind_speed) = match units {
            UnitSelection::Imperial => (self.temperature_f, self.wind_mph),
            UnitSelection::Metric => (round1(celsius), round1(self.wind_mph * KMH_PER_MPH)),
            UnitSelection::Scientific => {
                (round1(celsius + 273.15), round1(self.wind_mph * KMH_PER_MPH))
            }
        };

        RawCurrent {
            temperature: Some(temperature),
            humidity: Some(self.humidity),
            wind_speed: Some(wind_speed),
            pressure: Some(self.pressure),
            weather_descriptions: Some(vec![self.description.to_string()]),
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOCATIONS;

    #[test]
    fn covers_default_locations() {
        let sample: Vec<_> = SampleClient::locations().collect();
        assert_eq!(sample, DEFAULT_LOCATIONS);
    }

    #[tokio::test]
    async fn imperial_values_are_unconverted() {
        let raw = SampleClient::new()
            .fetch("Chicago", &Credential::default(), "f")
            .await
            .expect("observation");

        let current = raw.current.expect("current");
        assert_eq!(current.temperature, Some(35.0));
        assert_eq!(current.wind_speed, Some(15.0));
        assert_eq!(current.weather_descriptions, Some(vec!["Overcast".to_string()]));
    }

    #[tokio::test]
    async fn metric_and_scientific_are_converted() {
        let client = SampleClient::new();

        let metric = client.fetch("Phoenix", &Credential::default(), "m").await.unwrap();
        let current = metric.current.unwrap();
        assert_eq!(current.temperature, Some(23.9));
        assert_eq!(current.wind_speed, Some(9.7));

        let scientific = client.fetch("phoenix", &Credential::default(), "s").await.unwrap();
        assert_eq!(scientific.current.unwrap().temperature, Some(297.0));
    }

    #[tokio::test]
    async fn unknown_location_has_no_current() {
        let raw = SampleClient::new()
            .fetch("Atlantis", &Credential::default(), "f")
            .await
            .expect("observation");
        assert!(raw.current.is_none());
    }

    #[tokio::test]
    async fn unknown_units_code_is_provider_error() {
        let err = SampleClient::new()
            .fetch("Boston", &Credential::default(), "x")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "provider_error");
    }
}
