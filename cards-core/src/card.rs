use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{model::EntityKind, view::CardView};

/// Render handle for one entity: the view last drawn plus the timestamp of
/// the data behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub kind: EntityKind,
    pub label: Option<String>,
    /// Authority for the freshness check. Never moves backwards.
    pub last_updated: Option<DateTime<Utc>>,
    pub view: Option<CardView>,
}

impl Card {
    /// A blank card, as if freshly cloned from its template.
    pub fn blank(kind: EntityKind, label: Option<String>) -> Self {
        Self {
            kind,
            label,
            last_updated: None,
            view: None,
        }
    }
}

/// Cards by entity key, iterated in the order they were first seen.
#[derive(Debug, Default)]
pub struct CardStore {
    cards: HashMap<String, Card>,
    order: Vec<String>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Card> {
        self.cards.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Card> {
        self.cards.get_mut(key)
    }

    /// Inserts or replaces the card for `key`; a new key goes to the end.
    pub fn set(&mut self, key: &str, card: Card) {
        if self.cards.insert(key.to_string(), card).is_none() {
            self.order.push(key.to_string());
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Card> {
        let card = self.cards.remove(key)?;
        self.order.retain(|k| k != key);
        Some(card)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Card)> {
        self.order
            .iter()
            .filter_map(|k| self.cards.get(k).map(|card| (k.as_str(), card)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Loading indicator. Leaves the loading state once and never returns.
#[derive(Debug)]
pub struct LoadingState {
    loading: bool,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { loading: true }
    }
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns `true` only on the call that ends the loading state.
    pub fn finish(&mut self) -> bool {
        std::mem::replace(&mut self.loading, false)
    }
}

/// All mutable application state. Written only from the task driving the
/// orchestrator.
#[derive(Debug, Default)]
pub struct AppState {
    pub cards: CardStore,
    pub loading: LoadingState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
