//! Text rendering of card view-state.

use std::fmt::Write as _;

use cards_core::{
    AppState, Card, CardView, Entity,
    view::{ForecastView, RatesView},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub fn print_cards(state: &AppState) {
    if state.cards.is_empty() {
        println!("Nothing tracked. Add something with `cards add`.");
        return;
    }
    for (key, card) in state.cards.iter() {
        println!("{}", format_card(key, card));
    }
}

/// Prints the card for `key`, returning whether one exists.
pub fn print_card(state: &AppState, key: &str) -> bool {
    match state.cards.get(key) {
        Some(card) => {
            println!("{}", format_card(key, card));
            true
        }
        None => false,
    }
}

pub fn print_json(state: &AppState) -> anyhow::Result<()> {
    let cards: Vec<CardJson<'_>> = state
        .cards
        .iter()
        .map(|(key, card)| CardJson {
            key,
            label: card.label.as_deref(),
            kind: card.kind.as_str(),
            last_updated: card.last_updated,
            view: card.view.as_ref(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&cards)?);
    Ok(())
}

pub fn print_entities(entities: &[Entity]) {
    if entities.is_empty() {
        println!("Nothing tracked. Add something with `cards add`.");
        return;
    }
    for entity in entities {
        match &entity.label {
            Some(label) => println!("{:<8} {:<10} {label}", entity.kind, entity.key),
            None => println!("{:<8} {}", entity.kind, entity.key),
        }
    }
}

#[derive(Serialize)]
struct CardJson<'a> {
    key: &'a str,
    label: Option<&'a str>,
    kind: &'static str,
    last_updated: Option<DateTime<Utc>>,
    view: Option<&'a CardView>,
}

pub fn format_card(key: &str, card: &Card) -> String {
    match &card.view {
        Some(CardView::Forecast(view)) => {
            format_forecast(card.label.as_deref().unwrap_or(key), view)
        }
        Some(CardView::Rates(view)) => format_rates(view),
        None => format!("{key}: (no data)"),
    }
}

fn format_forecast(title: &str, view: &ForecastView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {title} ==");
    let _ = writeln!(out, "{}  {}", view.date, view.description);
    let _ = writeln!(
        out,
        "{}°  humidity {}%  wind {} @ {}°",
        view.temperature, view.humidity, view.wind_speed, view.wind_direction
    );
    let _ = writeln!(out, "sunrise {}  sunset {}", view.sunrise, view.sunset);
    for day in &view.days {
        let _ = writeln!(out, "  {}  {:>4}° / {:>4}°", day.label, day.high, day.low);
    }
    if let Some(created) = &view.created {
        let _ = write!(out, "updated {created}");
    }
    out.trim_end().to_string()
}

fn format_rates(view: &RatesView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== 1 {} ==", view.base);
    for (code, rate) in &view.rates {
        let _ = writeln!(out, "  {code}  {rate}");
    }
    if let Some(date) = &view.date {
        let _ = write!(out, "as of {date}");
    }
    out.trim_end().to_string()
}
