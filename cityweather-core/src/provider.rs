use crate::{
    Config,
    error::{ConfigError, ProviderFailure},
    model::{Credential, RawObservation},
    provider::{sample::SampleClient, weatherstack::WeatherstackClient},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod sample;
pub mod weatherstack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Weatherstack,
    Sample,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Weatherstack => "weatherstack",
            ProviderId::Sample => "sample",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Weatherstack, ProviderId::Sample]
    }

    /// Whether requests leave the process (and so need a credential and a delay).
    pub fn is_remote(&self) -> bool {
        matches!(self, ProviderId::Weatherstack)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherstack" => Ok(ProviderId::Weatherstack),
            "sample" => Ok(ProviderId::Sample),
            _ => Err(ConfigError::UnknownProvider(value.to_string())),
        }
    }
}

/// Source of current-weather observations, one location per call.
///
/// Implementations send at most one request per call and never retry.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(
        &self,
        location: &str,
        credential: &Credential,
        provider_code: &str,
    ) -> Result<RawObservation, ProviderFailure>;
}

/// Construct a client from config and explicit ProviderId.
pub fn client_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherClient>> {
    let boxed: Box<dyn WeatherClient> = match id {
        ProviderId::Weatherstack => {
            Box::new(WeatherstackClient::new(config.base_url(), config.timeout())?)
        }
        ProviderId::Sample => Box::new(SampleClient::new()),
    };

    Ok(boxed)
}
