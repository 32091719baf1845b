use chrono::{Datelike, Local, Weekday};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    card::AppState,
    error::StoreError,
    model::{Entity, Payload, RatesPayload},
    provider::FetchGateway,
    reconcile::{Reconciled, reconcile},
    registry::Registry,
    store::KeyValueStore,
};

/// Tally of what a batch of fetches did to the cards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub created: usize,
    pub updated: usize,
    pub stale: usize,
    /// Payloads that were fallbacks rather than live data.
    pub fallbacks: usize,
}

impl RefreshReport {
    fn record(&mut self, outcome: Reconciled) {
        match outcome {
            Reconciled::Created => self.created += 1,
            Reconciled::Updated => self.updated += 1,
            Reconciled::Stale => self.stale += 1,
        }
    }

    pub fn rendered(&self) -> usize {
        self.created + self.updated
    }
}

fn local_weekday() -> Weekday {
    Local::now().weekday()
}

/// Drives fetches for tracked entities and feeds results to the reconciler.
///
/// Fetches within one call run concurrently; results are applied one by one
/// in arrival order, so `state` has a single writer.
#[derive(Debug)]
pub struct App<G, S> {
    state: AppState,
    registry: Registry<S>,
    gateway: G,
    clock: fn() -> Weekday,
}

impl<G: FetchGateway, S: KeyValueStore> App<G, S> {
    pub fn new(gateway: G, registry: Registry<S>) -> Self {
        Self {
            state: AppState::new(),
            registry,
            gateway,
            clock: local_weekday,
        }
    }

    /// Overrides how "today" is determined for forecast day labels.
    pub fn with_clock(mut self, clock: fn() -> Weekday) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Startup: a first run shows the rates fallback straight away, otherwise
    /// every tracked entity is fetched.
    pub async fn start(&mut self) -> RefreshReport {
        if self.registry.is_first_run() {
            info!("first run, showing fallback rates");
            let mut report = RefreshReport {
                fallbacks: 1,
                ..RefreshReport::default()
            };
            let payload = Payload::Rates(RatesPayload::fallback());
            report.record(reconcile(&mut self.state, &payload, (self.clock)()));
            return report;
        }

        let targets = self.registry.entities().to_vec();
        debug!(count = targets.len(), "fetching tracked entities");
        self.fetch_and_settle(targets).await
    }

    /// Re-fetches every card currently shown.
    pub async fn refresh_all(&mut self) -> RefreshReport {
        let targets: Vec<Entity> = self
            .state
            .cards
            .iter()
            .map(|(key, card)| Entity {
                key: key.to_string(),
                label: card.label.clone(),
                kind: card.kind,
            })
            .collect();
        debug!(count = targets.len(), "refreshing all cards");
        self.fetch_and_settle(targets).await
    }

    /// Tracks `entity` (persisting the set) and fetches it. An already
    /// tracked key is not appended again but is still fetched.
    pub async fn add_and_refresh(&mut self, entity: Entity) -> Result<RefreshReport, StoreError> {
        if self.registry.add(entity.clone())? {
            info!(key = %entity.key, kind = %entity.kind, "now tracking entity");
        }
        Ok(self.fetch_and_settle(vec![entity]).await)
    }

    /// Stops tracking `key` and drops its card.
    pub fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        let tracked = self.registry.remove(key)?;
        let shown = self.state.cards.remove(key).is_some();
        if tracked {
            info!(key, "stopped tracking entity");
        }
        Ok(tracked || shown)
    }

    async fn fetch_and_settle(&mut self, targets: Vec<Entity>) -> RefreshReport {
        let today = (self.clock)();
        let gateway = &self.gateway;
        let state = &mut self.state;

        let mut pending: FuturesUnordered<_> = targets
            .into_iter()
            .map(|entity| async move {
                let result = gateway.fetch(&entity).await;
                (entity, result)
            })
            .collect();

        let mut report = RefreshReport::default();
        while let Some((entity, result)) = pending.next().await {
            let payload = match result {
                Ok(payload) => payload,
                Err(failure) => {
                    warn!(
                        key = %entity.key,
                        kind = %entity.kind,
                        error = %failure,
                        "fetch failed, rendering fallback"
                    );
                    report.fallbacks += 1;
                    Payload::fallback(entity.kind)
                }
            };
            report.record(reconcile(state, &payload, today));
        }
        report
    }
}
