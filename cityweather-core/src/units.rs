use std::{convert::TryFrom, fmt, str::FromStr};

use crate::error::ConfigError;

/// Unit system for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitSelection {
    #[default]
    Imperial,
    Metric,
    Scientific,
}

/// Provider unit code plus the column labels that go with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLabels {
    pub provider_code: &'static str,
    pub temperature_label: &'static str,
    pub speed_label: &'static str,
    pub pressure_label: &'static str,
}

impl UnitSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSelection::Imperial => "imperial",
            UnitSelection::Metric => "metric",
            UnitSelection::Scientific => "scientific",
        }
    }

    pub const fn all() -> &'static [UnitSelection] {
        &[UnitSelection::Imperial, UnitSelection::Metric, UnitSelection::Scientific]
    }

    pub fn resolve(self) -> UnitLabels {
        resolve(self)
    }
}

/// Map a selection to the provider's `units` code and display labels.
///
/// Weatherstack reports scientific temperatures in Kelvin but keeps km/h for wind.
pub fn resolve(selection: UnitSelection) -> UnitLabels {
    let (provider_code, temperature_label, speed_label) = match selection {
        UnitSelection::Imperial => ("f", "°F", "mph"),
        UnitSelection::Metric => ("m", "°C", "km/h"),
        UnitSelection::Scientific => ("s", "K", "km/h"),
    };

    UnitLabels { provider_code, temperature_label, speed_label, pressure_label: "mb" }
}

impl fmt::Display for UnitSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSelection {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "f" | "imperial" | "fahrenheit" => Ok(UnitSelection::Imperial),
            "m" | "metric" => Ok(UnitSelection::Metric),
            "s" | "scientific" => Ok(UnitSelection::Scientific),
            _ => Err(ConfigError::UnknownUnits(value.to_string())),
        }
    }
}

impl FromStr for UnitSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitSelection::try_from(s)
    }
}
