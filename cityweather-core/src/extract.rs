use crate::{
    error::ExtractionFailure,
    model::{RawObservation, WeatherRecord},
};

/// Turn a provider body into a table row.
///
/// Only `current.temperature` is required. Other fields fall back to sentinels
/// (`0`, `0.0`, empty description) so a sparse observation still yields a row.
pub fn extract(location: &str, raw: &RawObservation) -> Result<WeatherRecord, ExtractionFailure> {
    let current = raw.current.as_ref().ok_or(ExtractionFailure::MissingCurrent)?;
    let temperature = current.temperature.ok_or(ExtractionFailure::MissingTemperature)?;

    let description = current
        .weather_descriptions
        .as_ref()
        .and_then(|d| d.first())
        .cloned()
        .unwrap_or_default();

    Ok(WeatherRecord {
        location: location.to_string(),
        temperature,
        humidity: current.humidity.unwrap_or(0),
        wind_speed: current.wind_speed.unwrap_or(0.0),
        pressure: current.pressure.unwrap_or(0),
        description,
    })
}
