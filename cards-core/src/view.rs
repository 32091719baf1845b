//! Structured view-state for a card. The presentation layer turns these into
//! whatever it draws; nothing here knows about a render surface.

use chrono::Weekday;
use serde::Serialize;

use crate::model::{ForecastPayload, Payload, RatesPayload};

pub const DAYS_OF_WEEK: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Number of day slots on a forecast card.
pub const FORECAST_SLOTS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CardView {
    Forecast(ForecastView),
    Rates(RatesView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub created: Option<String>,
    pub description: String,
    pub date: String,
    pub code: i32,
    pub temperature: i64,
    pub sunrise: String,
    pub sunset: String,
    pub humidity: i64,
    pub wind_speed: i64,
    pub wind_direction: String,
    pub days: Vec<DayView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub label: &'static str,
    pub code: i32,
    pub high: i64,
    pub low: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatesView {
    pub base: String,
    pub date: Option<String>,
    /// Ordered by currency code; values keep full precision.
    pub rates: Vec<(String, f64)>,
}

/// Builds the view for `payload`. `today` anchors the forecast day labels.
pub fn render(payload: &Payload, today: Weekday) -> CardView {
    match payload {
        Payload::Forecast(p) => CardView::Forecast(render_forecast(p, today)),
        Payload::Rates(p) => CardView::Rates(render_rates(p)),
    }
}

fn render_forecast(p: &ForecastPayload, today: Weekday) -> ForecastView {
    let channel = &p.channel;
    let condition = &channel.item.condition;
    let today = today.num_days_from_monday() as usize;

    let days = channel
        .item
        .forecast
        .iter()
        .take(FORECAST_SLOTS)
        .enumerate()
        .map(|(slot, daily)| DayView {
            label: day_label(today, slot),
            code: daily.code,
            high: round_half_up(daily.high),
            low: round_half_up(daily.low),
        })
        .collect();

    ForecastView {
        created: p.created.clone(),
        description: condition.text.clone(),
        date: condition.date.clone(),
        code: condition.code,
        temperature: round_half_up(condition.temp),
        sunrise: channel.astronomy.sunrise.clone(),
        sunset: channel.astronomy.sunset.clone(),
        humidity: round_half_up(channel.atmosphere.humidity),
        wind_speed: round_half_up(channel.wind.speed),
        wind_direction: channel.wind.direction.clone(),
        days,
    }
}

fn render_rates(p: &RatesPayload) -> RatesView {
    RatesView {
        base: p.base.clone(),
        date: p.date.clone(),
        rates: p
            .rates
            .iter()
            .map(|(code, rate)| (code.clone(), *rate))
            .collect(),
    }
}

/// Week-name for forecast slot `slot` when today has Monday-based index `today`.
pub fn day_label(today: usize, slot: usize) -> &'static str {
    DAYS_OF_WEEK[(today + slot) % DAYS_OF_WEEK.len()]
}

/// Rounds like a browser's `Math.round`: halves go toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastPayload, RatesPayload};

    #[test]
    fn day_labels_wrap_around_the_week() {
        assert_eq!(day_label(5, 0), "Sat");
        assert_eq!(day_label(5, 3), "Tue");
        assert_eq!(day_label(6, 1), "Mon");
    }

    #[test]
    fn rounding_matches_browser_semantics() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.51), -3);
        assert_eq!(round_half_up(56.0), 56);
    }

    #[test]
    fn forecast_view_labels_days_from_today() {
        let payload = Payload::Forecast(ForecastPayload::fallback());
        let CardView::Forecast(view) = render(&payload, Weekday::Sat) else {
            panic!("expected forecast view");
        };

        let labels: Vec<_> = view.days.iter().map(|d| d.label).collect();
        assert_eq!(labels, ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"]);
        assert_eq!(view.temperature, 56);
        assert_eq!(view.humidity, 56);
        assert_eq!(view.wind_speed, 25);
        assert_eq!(view.wind_direction, "195");
        assert_eq!(view.days[3].high, 75);
        assert_eq!(view.days[3].low, 89);
    }

    #[test]
    fn forecast_view_rounds_display_values() {
        let mut payload = ForecastPayload::fallback();
        payload.channel.item.condition.temp = 71.5;
        payload.channel.atmosphere.humidity = 43.4;
        payload.channel.wind.speed = 6.6;
        payload.channel.item.forecast[0].high = 80.5;
        payload.channel.item.forecast[0].low = 59.49;

        let CardView::Forecast(view) = render(&Payload::Forecast(payload), Weekday::Mon) else {
            panic!("expected forecast view");
        };
        assert_eq!(view.temperature, 72);
        assert_eq!(view.humidity, 43);
        assert_eq!(view.wind_speed, 7);
        assert_eq!(view.days[0].high, 81);
        assert_eq!(view.days[0].low, 59);
    }

    #[test]
    fn short_forecast_fills_only_available_slots() {
        let mut payload = ForecastPayload::fallback();
        payload.channel.item.forecast.truncate(3);

        let CardView::Forecast(view) = render(&Payload::Forecast(payload), Weekday::Mon) else {
            panic!("expected forecast view");
        };
        assert_eq!(view.days.len(), 3);
    }

    #[test]
    fn long_forecast_is_capped_at_seven_slots() {
        let mut payload = ForecastPayload::fallback();
        let extra = payload.channel.item.forecast[0].clone();
        payload.channel.item.forecast.push(extra);

        let CardView::Forecast(view) = render(&Payload::Forecast(payload), Weekday::Mon) else {
            panic!("expected forecast view");
        };
        assert_eq!(view.days.len(), FORECAST_SLOTS);
    }

    #[test]
    fn rates_view_keeps_full_precision() {
        let CardView::Rates(view) = render(&Payload::Rates(RatesPayload::fallback()), Weekday::Mon)
        else {
            panic!("expected rates view");
        };

        assert_eq!(view.base, "USD");
        assert_eq!(view.date.as_deref(), Some("2017-05-19"));
        assert_eq!(view.rates.first(), Some(&("AUD".to_string(), 1.3446)));
        assert!(view.rates.contains(&("CHF".to_string(), 0.97692)));
    }
}
