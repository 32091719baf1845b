use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    Config,
    error::FetchFailure,
    model::{Entity, EntityKind, ForecastPayload, Payload, RatesPayload},
    provider::{fixer::FixerRatesSource, yql::YqlForecastSource},
};

pub mod fixer;
pub mod yql;

/// Remote source of payloads. Failures are values, not panics: callers
/// substitute a fallback payload.
#[async_trait]
pub trait FetchGateway: Send + Sync + Debug {
    async fn fetch_forecast(
        &self,
        key: &str,
        label: Option<&str>,
    ) -> Result<ForecastPayload, FetchFailure>;

    async fn fetch_rates(&self, base: &str) -> Result<RatesPayload, FetchFailure>;

    /// Fetches `entity` through the call shape its kind uses.
    async fn fetch(&self, entity: &Entity) -> Result<Payload, FetchFailure> {
        match entity.kind {
            EntityKind::Forecast => self
                .fetch_forecast(&entity.key, entity.label.as_deref())
                .await
                .map(Payload::Forecast),
            EntityKind::Rates => self.fetch_rates(&entity.key).await.map(Payload::Rates),
        }
    }
}

/// Gateway backed by the public forecast and exchange-rate HTTP APIs.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    forecast: YqlForecastSource,
    rates: FixerRatesSource,
}

impl HttpGateway {
    pub fn new(
        forecast_base_url: impl Into<String>,
        rates_base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            forecast: YqlForecastSource::new(forecast_base_url.into(), http.clone()),
            rates: FixerRatesSource::new(rates_base_url.into(), http),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.forecast_base_url,
            &config.rates_base_url,
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    async fn fetch_forecast(
        &self,
        key: &str,
        label: Option<&str>,
    ) -> Result<ForecastPayload, FetchFailure> {
        self.forecast.fetch(key, label).await
    }

    async fn fetch_rates(&self, base: &str) -> Result<RatesPayload, FetchFailure> {
        self.rates.fetch(base).await
    }
}

/// Reads the body and turns a non-success status into a failure.
async fn success_body(res: reqwest::Response) -> Result<String, FetchFailure> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(FetchFailure::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }
    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
