//! The engine facade driven by the session scheduler.
//!
//! A [`Board`] pairs the [`StateStore`] with the [`Reconciler`]. A sync
//! installs the new snapshot, reconciles it, and runs one display refresh
//! so freshly created countdown nodes get their text in the same batch. A
//! tick only runs the display refresh against the installed snapshot.

use chrono::{DateTime, Utc};
use orchard_types::{FruitId, Snapshot};
use tracing::{debug, info};

use crate::clock::DerivedClock;
use crate::config::EngineConfig;
use crate::display;
use crate::inventory::{InventoryFruitView, describe_inventory};
use crate::placement::PlacementAllocator;
use crate::pricing::{PricingEngine, SaleQuote};
use crate::reconcile::{IntegrityFault, Reconciler};
use crate::store::StateStore;
use crate::view::{ViewOp, ViewTree};

/// Outcome of applying a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    /// Store generation after the install.
    pub generation: u64,
    /// Reconciliation ops followed by display ops.
    pub ops: Vec<ViewOp>,
    /// Entity-local faults found while reconciling.
    pub faults: Vec<IntegrityFault>,
}

/// Current snapshot plus the view derived from it.
#[derive(Debug, Clone)]
pub struct Board {
    store: StateStore,
    reconciler: Reconciler,
}

impl Board {
    /// Board with nothing synced yet.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            store: StateStore::new(),
            reconciler: Reconciler::new(config),
        }
    }

    /// Install a snapshot from a sync or an action reply and reconcile it.
    pub fn apply(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> SyncOutcome {
        let generation = self.store.install(snapshot);
        let Some(current) = self.store.share() else {
            return SyncOutcome {
                generation,
                ..SyncOutcome::default()
            };
        };

        let report = self.reconciler.reconcile(&current);
        let mut ops = report.ops;
        ops.extend(display::refresh(
            self.reconciler.view_mut(),
            &current,
            &DerivedClock::at(now),
        ));

        debug!(
            generation,
            ops = ops.len(),
            faults = report.faults.len(),
            "snapshot applied"
        );
        if generation == 1 {
            info!(
                plots = current.owned_plot_count(),
                nodes = self.reconciler.tree().len(),
                "initial board built"
            );
        }

        SyncOutcome {
            generation,
            ops,
            faults: report.faults,
        }
    }

    /// Refresh clock-derived text. No-op before the first sync.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<ViewOp> {
        let Some(current) = self.store.share() else {
            return Vec::new();
        };
        display::refresh(self.reconciler.view_mut(), &current, &DerivedClock::at(now))
    }

    /// Drop the view, the placements, and the snapshot.
    pub fn teardown(&mut self) -> Vec<ViewOp> {
        self.store.clear();
        self.reconciler.teardown()
    }

    /// The installed snapshot.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.store.current()
    }

    /// Number of snapshots installed.
    pub const fn generation(&self) -> u64 {
        self.store.generation()
    }

    /// The retained view.
    pub const fn tree(&self) -> &ViewTree {
        self.reconciler.tree()
    }

    /// The placement registry.
    pub const fn placement(&self) -> &PlacementAllocator {
        self.reconciler.placement()
    }

    /// Quote the sale of selected inventory fruit.
    pub fn quote_sale(&self, ids: &[FruitId]) -> SaleQuote {
        self.store
            .current()
            .map(|snapshot| PricingEngine::quote_selection(snapshot, ids))
            .unwrap_or_default()
    }

    /// Inventory fruit descriptors.
    pub fn inventory(&self) -> Vec<InventoryFruitView> {
        self.store
            .current()
            .map(describe_inventory)
            .unwrap_or_default()
    }
}
