use reqwest::Client;
use tracing::debug;

use crate::{error::FetchFailure, model::RatesPayload};

use super::{success_body, trim_base};

/// Exchange rates from a fixer-style `/latest?base=` endpoint.
#[derive(Debug, Clone)]
pub struct FixerRatesSource {
    base_url: String,
    http: Client,
}

impl FixerRatesSource {
    pub fn new(base_url: String, http: Client) -> Self {
        Self {
            base_url: trim_base(base_url),
            http,
        }
    }

    pub async fn fetch(&self, base: &str) -> Result<RatesPayload, FetchFailure> {
        let url = format!("{}/latest", self.base_url);
        debug!(base, %url, "fetching rates");

        let res = self.http.get(&url).query(&[("base", base)]).send().await?;
        let body = success_body(res).await?;

        serde_json::from_str(&body).map_err(|e| FetchFailure::Decode(e.to_string()))
    }
}
