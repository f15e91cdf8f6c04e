use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use plandiff_core::collaborators::{Clock, FixedClock, SequentialIds};
use plandiff_core::model::{LineItem, NewVersion, Snapshot, SnapshotInput, Version, VersionKind};
use plandiff_core::ops::{SnapshotStore, VersionGraph};
use rust_decimal::Decimal;

/// Snapshot store and version graph with deterministic clocks and ids
#[allow(dead_code)]
pub struct TestBed {
    pub clock: Arc<FixedClock>,
    pub store: SnapshotStore,
    pub graph: VersionGraph,
}

#[allow(dead_code)]
impl TestBed {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
        ));
        Self {
            store: SnapshotStore::with_collaborators(
                clock.clone(),
                Arc::new(SequentialIds::new("snap")),
            ),
            graph: VersionGraph::with_collaborators(
                clock.clone(),
                Arc::new(SequentialIds::new("ver")),
            ),
            clock,
        }
    }

    /// Capture `input` and wrap it in a new version
    pub fn version(
        &self,
        document_id: &str,
        parent: Option<&str>,
        kind: VersionKind,
        input: SnapshotInput,
    ) -> Version {
        let snapshot = self.store.create(document_id, input).unwrap();
        let mut request = NewVersion::new(document_id, kind, format!("{} {}", document_id, kind));
        if let Some(parent) = parent {
            request = request.with_parent(parent);
        }
        self.graph.create_version(request, &snapshot).unwrap()
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn snapshot_of(&self, version: &Version) -> Arc<Snapshot> {
        self.store.get(&version.snapshot_id).unwrap()
    }
}

/// Line item with whole-number quantity and unit price
#[allow(dead_code)]
pub fn item(id: &str, name: &str, quantity: i64, unit_price: i64) -> LineItem {
    LineItem::new(id, name, "general", Decimal::new(quantity, 0), Decimal::new(unit_price, 0))
}

#[allow(dead_code)]
pub fn dec(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

/// The estimate used by the V1 -> V2 scenario: total 1,000,000
#[allow(dead_code)]
pub fn baseline_items() -> Vec<LineItem> {
    vec![
        item("foundation", "Foundation work", 1, 600_000),
        item("beam", "Steel beam", 2, 10_000),
        item("roof", "Roofing", 1, 380_000),
    ]
}
