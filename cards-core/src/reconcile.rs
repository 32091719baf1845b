//! Freshness reconciliation: decides whether an incoming payload replaces
//! what a card currently shows.

use chrono::Weekday;
use tracing::{debug, info};

use crate::{
    card::{AppState, Card},
    model::Payload,
    view::render,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// First sighting of the key; a new card was created and rendered.
    Created,
    /// The existing card was overwritten with the payload.
    Updated,
    /// The payload was older than what the card shows and was dropped.
    Stale,
}

impl Reconciled {
    pub fn rendered(&self) -> bool {
        !matches!(self, Reconciled::Stale)
    }
}

/// Merges `payload` into `state`.
///
/// A key seen for the first time is always rendered. Otherwise the payload is
/// dropped when its timestamp is strictly older than the card's, or when it
/// has no parseable timestamp but the card does. Equal timestamps overwrite,
/// so ties go to whichever payload arrives last.
pub fn reconcile(state: &mut AppState, payload: &Payload, today: Weekday) -> Reconciled {
    let key = payload.key();
    let incoming = payload.timestamp();

    let outcome = match state.cards.get_mut(key) {
        None => {
            let label = match payload {
                Payload::Forecast(p) => p.label.clone(),
                Payload::Rates(_) => None,
            };
            let mut card = Card::blank(payload.kind(), label);
            card.last_updated = incoming;
            card.view = Some(render(payload, today));
            state.cards.set(key, card);
            Reconciled::Created
        }
        Some(card) => {
            let stale = match (incoming, card.last_updated) {
                (Some(incoming), Some(shown)) => incoming < shown,
                (None, Some(_)) => true,
                (_, None) => false,
            };
            if stale {
                debug!(
                    key,
                    incoming = ?payload.raw_timestamp(),
                    shown = ?card.last_updated,
                    "dropping stale payload"
                );
                return Reconciled::Stale;
            }

            card.last_updated = incoming;
            card.view = Some(render(payload, today));
            Reconciled::Updated
        }
    };

    debug!(key, ?outcome, "card rendered");
    if state.loading.finish() {
        info!("first card rendered, leaving loading state");
    }
    outcome
}
