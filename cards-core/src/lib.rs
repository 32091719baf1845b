//! Core library for the `cards` app.
//!
//! This crate defines:
//! - The tracked-entity registry and its persistent key-value store
//! - Abstraction over the forecast and exchange-rate sources
//! - The card store and freshness reconciliation
//! - The refresh orchestrator tying them together
//!
//! It is used by `cards-cli`, but knows nothing about how cards are drawn.

pub mod card;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod reconcile;
pub mod registry;
pub mod store;
pub mod view;

pub use card::{AppState, Card, CardStore};
pub use config::Config;
pub use error::{FetchFailure, StoreError};
pub use model::{Entity, EntityKind, ForecastPayload, Payload, RatesPayload, TrackedSet};
pub use orchestrator::{App, RefreshReport};
pub use provider::{FetchGateway, HttpGateway};
pub use reconcile::{Reconciled, reconcile};
pub use registry::Registry;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::CardView;
