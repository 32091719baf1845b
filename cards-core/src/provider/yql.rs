use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::FetchFailure,
    model::{Channel, ForecastPayload},
};

use super::{success_body, trim_base};

/// Forecast source speaking the YQL `weather.forecast` query API.
#[derive(Debug, Clone)]
pub struct YqlForecastSource {
    base_url: String,
    http: Client,
}

impl YqlForecastSource {
    pub fn new(base_url: String, http: Client) -> Self {
        Self {
            base_url: trim_base(base_url),
            http,
        }
    }

    pub async fn fetch(
        &self,
        key: &str,
        label: Option<&str>,
    ) -> Result<ForecastPayload, FetchFailure> {
        let url = format!("{}/v1/public/yql", self.base_url);
        let statement = format!("select * from weather.forecast where woeid={key}");
        debug!(key, %url, "fetching forecast");

        let res = self
            .http
            .get(&url)
            .query(&[("format", "json"), ("q", statement.as_str())])
            .send()
            .await?;
        let body = success_body(res).await?;

        let parsed: YqlResponse =
            serde_json::from_str(&body).map_err(|e| FetchFailure::Decode(e.to_string()))?;

        let results = parsed.query.results.ok_or(FetchFailure::NoData)?;

        Ok(ForecastPayload {
            key: key.to_string(),
            label: label.map(str::to_string),
            created: parsed.query.created,
            channel: results.channel,
        })
    }
}

#[derive(Debug, Deserialize)]
struct YqlResponse {
    query: YqlQuery,
}

#[derive(Debug, Deserialize)]
struct YqlQuery {
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    results: Option<YqlResults>,
}

#[derive(Debug, Deserialize)]
struct YqlResults {
    channel: Channel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = r#"{
        "query": {
            "count": 1,
            "created": "2017-05-20T08:15:02Z",
            "results": {
                "channel": {
                    "astronomy": {"sunrise": "5:30 am", "sunset": "8:10 pm"},
                    "atmosphere": {"humidity": "61", "pressure": "1015.0"},
                    "wind": {"chill": "61", "direction": "230", "speed": "11"},
                    "item": {
                        "condition": {"code": "28", "date": "Sat, 20 May 2017 04:00 AM EDT", "temp": "61", "text": "Mostly Cloudy"},
                        "forecast": [
                            {"code": "30", "date": "20 May 2017", "day": "Sat", "high": "78", "low": "59", "text": "Partly Cloudy"},
                            {"code": "12", "date": "21 May 2017", "day": "Sun", "high": "66", "low": "56", "text": "Rain"}
                        ]
                    }
                }
            }
        }
    }"#;

    async fn mount(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v1/public/yql"))
            .and(query_param("format", "json"))
            .and(query_param(
                "q",
                "select * from weather.forecast where woeid=2459115",
            ))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_stamps_key_label_and_created() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

        let source = YqlForecastSource::new(server.uri(), Client::new());
        let payload = source
            .fetch("2459115", Some("New York, NY"))
            .await
            .expect("forecast");

        assert_eq!(payload.key, "2459115");
        assert_eq!(payload.label.as_deref(), Some("New York, NY"));
        assert_eq!(payload.created.as_deref(), Some("2017-05-20T08:15:02Z"));
        assert_eq!(payload.channel.item.condition.code, 28);
        assert_eq!(payload.channel.item.forecast.len(), 2);
        assert_eq!(payload.channel.wind.direction, "230");
    }

    #[tokio::test]
    async fn null_results_is_no_data() {
        let server = MockServer::start().await;
        let body = r#"{"query": {"count": 0, "created": "2017-05-20T08:15:02Z", "results": null}}"#;
        mount(&server, ResponseTemplate::new(200).set_body_string(body)).await;

        let source = YqlForecastSource::new(server.uri(), Client::new());
        let err = source.fetch("2459115", None).await.unwrap_err();
        assert_eq!(err, FetchFailure::NoData);
    }

    #[tokio::test]
    async fn error_status_is_failure() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(503).set_body_string("busy")).await;

        let source = YqlForecastSource::new(server.uri(), Client::new());
        let err = source.fetch("2459115", None).await.unwrap_err();
        assert_eq!(
            err,
            FetchFailure::Status {
                status: 503,
                body: "busy".to_string()
            }
        );
    }

    #[tokio::test]
    async fn garbage_body_is_decode_failure() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("<html>")).await;

        let source = YqlForecastSource::new(server.uri(), Client::new());
        let err = source.fetch("2459115", None).await.unwrap_err();
        assert!(matches!(err, FetchFailure::Decode(_)));
    }
}
