use std::collections::BTreeMap;

use rand::Rng;
use radar_schema::{Category, MarketItem};

use crate::config::RadarConfig;
use crate::geometry::place;

/// Ordered item collection, only ever replaced as a whole.
///
/// Every replacement bumps `version`, which keys the derived [`Layout`].
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<MarketItem>,
    version: u64,
}

impl ItemStore {
    pub fn new(items: Vec<MarketItem>) -> Self {
        Self { items, version: 1 }
    }

    pub fn items(&self) -> &[MarketItem] {
        &self.items
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn replace(&mut self, items: Vec<MarketItem>) -> u64 {
        self.items = items;
        self.version = self.version.wrapping_add(1);
        self.version
    }
}

/// Items bucketed by category, preserving store order within each bucket.
pub fn group_by_category(items: &[MarketItem]) -> BTreeMap<Category, Vec<MarketItem>> {
    let mut groups: BTreeMap<Category, Vec<MarketItem>> = BTreeMap::new();
    for item in items {
        groups.entry(item.category).or_default().push(item.clone());
    }
    groups
}

/// Positions and groupings derived from a store version.
///
/// Recomputed only when the store version changes, so positions drawn for a
/// loaded item set survive any number of redraws.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    version: Option<u64>,
    placed: Vec<MarketItem>,
    groups: BTreeMap<Category, Vec<MarketItem>>,
}

impl Layout {
    /// Bring the layout up to date with `store`; returns whether it was rebuilt.
    pub fn sync<R: Rng + ?Sized>(
        &mut self,
        store: &ItemStore,
        config: &RadarConfig,
        rng: &mut R,
    ) -> bool {
        if self.version == Some(store.version()) {
            return false;
        }
        self.placed = place(store.items(), config, rng);
        self.groups = group_by_category(&self.placed);
        self.version = Some(store.version());
        tracing::debug!(
            target: "market_radar::layout",
            version = store.version(),
            items = self.placed.len(),
            "layout.rebuilt"
        );
        true
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn placed(&self) -> &[MarketItem] {
        &self.placed
    }

    pub fn groups(&self) -> &BTreeMap<Category, Vec<MarketItem>> {
        &self.groups
    }

    pub fn find(&self, id: i64) -> Option<&MarketItem> {
        self.placed.iter().find(|item| item.id == id)
    }
}
