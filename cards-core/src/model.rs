use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which remote source an entity is fetched from, and which card it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Forecast,
    /// Entries persisted before kinds existed only carry a currency key.
    #[default]
    Rates,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Forecast => "forecast",
            EntityKind::Rates => "rates",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A city or currency base the user follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: EntityKind,
}

impl Entity {
    pub fn forecast(key: impl Into<String>, label: Option<String>) -> Self {
        Self {
            key: key.into(),
            label,
            kind: EntityKind::Forecast,
        }
    }

    pub fn rates(base: impl Into<String>) -> Self {
        Self {
            key: base.into(),
            label: None,
            kind: EntityKind::Rates,
        }
    }
}

/// Display-ordered sequence of tracked entities.
pub type TrackedSet = Vec<Entity>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub astronomy: Astronomy,
    pub item: Item,
    pub atmosphere: Atmosphere,
    pub wind: Wind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Astronomy {
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub condition: Condition,
    #[serde(default)]
    pub forecast: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub date: String,
    #[serde(deserialize_with = "lenient::number")]
    pub temp: f64,
    #[serde(deserialize_with = "lenient::code")]
    pub code: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(deserialize_with = "lenient::code")]
    pub code: i32,
    #[serde(deserialize_with = "lenient::number")]
    pub high: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub low: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    #[serde(deserialize_with = "lenient::number")]
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(deserialize_with = "lenient::number")]
    pub speed: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesPayload {
    pub base: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

/// A fetched, immutable snapshot for one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Forecast(ForecastPayload),
    Rates(RatesPayload),
}

impl Payload {
    /// Card Store key. Forecasts use `key`, rates use `base`.
    pub fn key(&self) -> &str {
        match self {
            Payload::Forecast(p) => &p.key,
            Payload::Rates(p) => &p.base,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Payload::Forecast(_) => EntityKind::Forecast,
            Payload::Rates(_) => EntityKind::Rates,
        }
    }

    pub fn raw_timestamp(&self) -> Option<&str> {
        match self {
            Payload::Forecast(p) => p.created.as_deref(),
            Payload::Rates(p) => p.date.as_deref(),
        }
    }

    /// Parsed freshness timestamp; `None` when missing or unparseable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.raw_timestamp().and_then(parse_timestamp)
    }

    /// The fixed first-run payload of `kind`, keyed as the fallback literal
    /// itself is (`USD` for rates, New York for forecasts).
    pub fn fallback(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Forecast => Payload::Forecast(ForecastPayload::fallback()),
            EntityKind::Rates => Payload::Rates(RatesPayload::fallback()),
        }
    }
}

/// Parses the timestamp shapes the remote feeds emit: RFC 3339, RFC 2822, or a
/// bare calendar date (taken as UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

impl ForecastPayload {
    /// Shown on first use and whenever a forecast fetch fails.
    pub fn fallback() -> Self {
        let days = [
            (44, 86.0, 70.0),
            (44, 94.0, 73.0),
            (4, 95.0, 78.0),
            (24, 75.0, 89.0),
            (24, 89.0, 77.0),
            (44, 92.0, 79.0),
            (44, 89.0, 77.0),
        ];

        Self {
            key: "2459115".to_string(),
            label: Some("New York, NY".to_string()),
            created: Some("2016-07-22T01:00:00Z".to_string()),
            channel: Channel {
                astronomy: Astronomy {
                    sunrise: "5:43 am".to_string(),
                    sunset: "8:21 pm".to_string(),
                },
                item: Item {
                    condition: Condition {
                        text: "Windy".to_string(),
                        date: "Thu, 21 Jul 2016 09:00 PM EDT".to_string(),
                        temp: 56.0,
                        code: 24,
                    },
                    forecast: days
                        .iter()
                        .map(|&(code, high, low)| DailyForecast { code, high, low })
                        .collect(),
                },
                atmosphere: Atmosphere { humidity: 56.0 },
                wind: Wind {
                    speed: 25.0,
                    direction: "195".to_string(),
                },
            },
        }
    }
}

impl RatesPayload {
    /// Shown on first use and whenever a rates fetch fails.
    pub fn fallback() -> Self {
        let rates = [
            ("AUD", 1.3446),
            ("BGN", 1.7495),
            ("BRL", 3.3301),
            ("CAD", 1.3569),
            ("CHF", 0.97692),
            ("CNY", 6.8893),
            ("CZK", 23.708),
            ("DKK", 6.6563),
            ("GBP", 0.76848),
            ("HKD", 7.7824),
            ("HRK", 6.6544),
            ("HUF", 276.95),
            ("IDR", 13312.0),
            ("ILS", 3.5859),
            ("INR", 64.587),
            ("JPY", 111.24),
            ("KRW", 1119.5),
            ("MXN", 18.73),
            ("MYR", 4.3215),
            ("NOK", 8.4017),
            ("NZD", 1.4516),
            ("PHP", 49.704),
            ("PLN", 3.7575),
            ("RON", 4.0793),
            ("RUB", 57.054),
            ("SEK", 8.7569),
            ("SGD", 1.3873),
            ("THB", 34.37),
            ("TRY", 3.6027),
            ("ZAR", 13.263),
            ("EUR", 0.89453),
        ];

        Self {
            base: "USD".to_string(),
            date: Some("2017-05-19".to_string()),
            rates: rates
                .iter()
                .map(|&(code, rate)| (code.to_string(), rate))
                .collect(),
        }
    }

    /// Currency codes a user can pick as a new base.
    pub fn known_currencies() -> Vec<String> {
        let fallback = Self::fallback();
        let mut codes: Vec<String> = fallback.rates.into_keys().collect();
        codes.push(fallback.base);
        codes.sort();
        codes
    }
}

/// The forecast feed encodes most numbers as strings.
mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match NumberOrString::deserialize(d)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
        }
    }

    pub fn code<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
        let n = number(d)?;
        if n.fract() != 0.0 || n < i32::MIN as f64 || n > i32::MAX as f64 {
            return Err(D::Error::custom(format!("expected an integer code, got {n}")));
        }
        Ok(n as i32)
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match StringOrNumber::deserialize(d)? {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        })
    }
}
