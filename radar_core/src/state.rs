//! Application state aggregate.
//!
//! [`RadarState`] owns the item collection and every piece of view state.
//! Each user action or completed background task is applied through exactly
//! one method, so the front-end never mutates fields directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use radar_schema::{Category, MarketItem, TooltipData};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chart::RadarScene;
use crate::config::RadarConfig;
use crate::export::{ExportError, ExportKind, ExportSnapshot};
use crate::history::{History, HistoryError};
use crate::import::ImportError;
use crate::store::{ItemStore, Layout};

pub const DEFAULT_TITLE: &str = "Market Context Radar";
pub const DEFAULT_SUBTITLE: &str = "Today's environment reflects both effects from an economic slowdown, as well as opportunities and risks driven by AI.";
pub const INITIAL_CHECKPOINT: &str = "Initial data";

/// Identifies the most recent insight request; older results are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InsightTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum InsightStatus {
    Loading,
    Ready(String),
}

/// The insight modal: selected item plus request progress.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightView {
    pub item: MarketItem,
    pub status: InsightStatus,
}

impl InsightView {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, InsightStatus::Loading)
    }
}

/// Work order for one export; holds its own copy of the view.
#[derive(Debug, Clone)]
pub struct ExportTicket {
    pub kind: ExportKind,
    pub snapshot: ExportSnapshot,
}

#[derive(Debug)]
pub struct RadarState {
    config: Arc<RadarConfig>,
    rng: ChaCha8Rng,
    title: String,
    subtitle: String,
    store: ItemStore,
    layout: Layout,
    history: History,
    hovered: Option<i64>,
    tooltip: Option<TooltipData>,
    insight: Option<InsightView>,
    latest_ticket: u64,
    importing: bool,
    export_in_flight: Option<ExportKind>,
    last_export: Option<PathBuf>,
    error: Option<String>,
}

impl RadarState {
    /// Start with `items`, positioned from `seed`, and record the initial checkpoint.
    pub fn new(config: Arc<RadarConfig>, items: Vec<MarketItem>, seed: u64) -> Self {
        let mut state = Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            store: ItemStore::new(items),
            layout: Layout::default(),
            history: History::default(),
            hovered: None,
            tooltip: None,
            insight: None,
            latest_ticket: 0,
            importing: false,
            export_in_flight: None,
            last_export: None,
            error: None,
        };
        state.refresh_layout();
        state
            .history
            .record(INITIAL_CHECKPOINT, state.layout.placed());
        state
    }

    fn refresh_layout(&mut self) {
        self.layout.sync(&self.store, &self.config, &mut self.rng);
    }

    fn replace_items(&mut self, items: Vec<MarketItem>) {
        self.store.replace(items);
        self.refresh_layout();
        self.hovered = None;
        self.tooltip = None;
    }

    // --- import -----------------------------------------------------------

    pub fn begin_import(&mut self) {
        self.importing = true;
        self.error = None;
    }

    /// Apply a parsed import. The collection is only replaced on success.
    pub fn complete_import(
        &mut self,
        source: &Path,
        result: Result<Vec<MarketItem>, ImportError>,
    ) -> bool {
        self.importing = false;
        match result {
            Ok(items) => {
                let name = source
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source.display().to_string());
                self.replace_items(items);
                self.history
                    .record(format!("Imported {name}"), self.layout.placed());
                self.error = None;
                tracing::info!(
                    target: "market_radar::import",
                    source = %name,
                    items = self.store.len(),
                    "import.applied"
                );
                true
            }
            Err(err) => {
                tracing::warn!(
                    target: "market_radar::import",
                    row = err.row(),
                    error = %err,
                    "import.rejected"
                );
                self.error = Some(err.to_string());
                false
            }
        }
    }

    /// The file could not be read at all.
    pub fn fail_import(&mut self, message: impl Into<String>) {
        self.importing = false;
        let message = message.into();
        tracing::warn!(target: "market_radar::import", error = %message, "import.failed");
        self.error = Some(message);
    }

    // --- pointer ----------------------------------------------------------

    pub fn hover_bubble(&mut self, item_id: i64, x: f64, y: f64) {
        let Some(item) = self.layout.find(item_id) else {
            return;
        };
        self.tooltip = Some(TooltipData {
            content: item.text.clone(),
            x,
            y,
        });
        self.hovered = Some(item_id);
    }

    /// Moves the tooltip along with the pointer; no-op when nothing is hovered.
    pub fn move_pointer(&mut self, x: f64, y: f64) {
        if let Some(tooltip) = self.tooltip.as_mut() {
            tooltip.x = x;
            tooltip.y = y;
        }
    }

    pub fn leave_bubble(&mut self) {
        self.hovered = None;
        self.tooltip = None;
    }

    /// Route a pointer sample to enter, move or leave based on the bubble under it.
    pub fn track_pointer(&mut self, hit: Option<i64>, x: f64, y: f64) {
        match (hit, self.hovered) {
            (Some(id), Some(current)) if id == current => self.move_pointer(x, y),
            (Some(id), _) => self.hover_bubble(id, x, y),
            (None, Some(_)) => self.leave_bubble(),
            (None, None) => {}
        }
    }

    // --- insight ----------------------------------------------------------

    /// Open the insight modal for `item_id` in the loading state.
    ///
    /// Returns the ticket the eventual result must present, or `None` when the
    /// id is unknown.
    pub fn select_item(&mut self, item_id: i64) -> Option<InsightTicket> {
        let item = self.layout.find(item_id)?.clone();
        self.latest_ticket += 1;
        tracing::debug!(
            target: "market_radar::insight",
            item = item_id,
            ticket = self.latest_ticket,
            "insight.requested"
        );
        self.insight = Some(InsightView {
            item,
            status: InsightStatus::Loading,
        });
        Some(InsightTicket(self.latest_ticket))
    }

    /// Show `text` if `ticket` is still the latest request and the modal is open.
    pub fn resolve_insight(&mut self, ticket: InsightTicket, text: String) -> bool {
        let current = ticket.0 == self.latest_ticket;
        match self.insight.as_mut() {
            Some(view) if current => {
                view.status = InsightStatus::Ready(text);
                true
            }
            _ => {
                tracing::debug!(
                    target: "market_radar::insight",
                    ticket = ticket.0,
                    latest = self.latest_ticket,
                    "insight.discarded"
                );
                false
            }
        }
    }

    pub fn close_insight(&mut self) {
        self.insight = None;
    }

    // --- header -----------------------------------------------------------

    /// Saves the trimmed value; blank input keeps the current title.
    pub fn set_title(&mut self, value: &str) -> bool {
        apply_edit(&mut self.title, value)
    }

    pub fn set_subtitle(&mut self, value: &str) -> bool {
        apply_edit(&mut self.subtitle, value)
    }

    // --- export -----------------------------------------------------------

    /// Claim the export slot. Returns `None` while another export is running.
    pub fn begin_export(&mut self, kind: ExportKind) -> Option<ExportTicket> {
        if let Some(running) = self.export_in_flight {
            tracing::debug!(
                target: "market_radar::export",
                requested = %kind,
                running = %running,
                "export.busy"
            );
            return None;
        }
        self.export_in_flight = Some(kind);
        Some(ExportTicket {
            kind,
            snapshot: self.export_snapshot(),
        })
    }

    /// Release the export slot whatever the outcome.
    pub fn finish_export(&mut self, kind: ExportKind, result: Result<PathBuf, ExportError>) {
        self.export_in_flight = None;
        match result {
            Ok(path) => self.last_export = Some(path),
            Err(err) => {
                tracing::warn!(
                    target: "market_radar::export",
                    kind = %kind,
                    error = %err,
                    "export.failed"
                );
                self.error = Some(format!("Could not generate {kind}: {err}"));
            }
        }
    }

    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            items: self.layout.placed().to_vec(),
            config: Arc::clone(&self.config),
        }
    }

    // --- history ----------------------------------------------------------

    pub fn save_checkpoint(&mut self, name: &str) -> usize {
        let name = match name.trim() {
            "" => format!("Checkpoint {}", self.history.len() + 1),
            trimmed => trimmed.to_string(),
        };
        self.history.record(name, self.layout.placed())
    }

    /// Restore checkpoint `index`; returns `false` when it was already active.
    pub fn revert_to(&mut self, index: usize) -> Result<bool, HistoryError> {
        match self.history.revert(index)? {
            Some(items) => {
                self.replace_items(items);
                tracing::info!(
                    target: "market_radar::history",
                    index,
                    items = self.store.len(),
                    "history.reverted"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // --- read access ------------------------------------------------------

    pub fn config(&self) -> &Arc<RadarConfig> {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// Items as stored, before placement.
    pub fn items(&self) -> &[MarketItem] {
        self.store.items()
    }

    pub fn placed_items(&self) -> &[MarketItem] {
        self.layout.placed()
    }

    pub fn groups(&self) -> &BTreeMap<Category, Vec<MarketItem>> {
        self.layout.groups()
    }

    pub fn scene(&self, side: f64) -> RadarScene {
        RadarScene::build(self.layout.placed(), &self.config, side)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tooltip(&self) -> Option<&TooltipData> {
        self.tooltip.as_ref()
    }

    pub fn insight(&self) -> Option<&InsightView> {
        self.insight.as_ref()
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    pub fn export_in_flight(&self) -> Option<ExportKind> {
        self.export_in_flight
    }

    pub fn last_export(&self) -> Option<&Path> {
        self.last_export.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

fn apply_edit(field: &mut String, value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == field.as_str() {
        return false;
    }
    *field = trimmed.to_string();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_schema::{sample_items, Impact, Position};

    fn state() -> RadarState {
        RadarState::new(Arc::new(RadarConfig::default()), sample_items(), 7)
    }

    fn imported() -> Vec<MarketItem> {
        vec![
            MarketItem::new(1, "Rates stay high", Category::Macro, Impact::Near),
            MarketItem::new(2, "New entrants", Category::Competition, Impact::Long),
        ]
    }

    #[test]
    fn startup_places_every_item_and_records_initial_checkpoint() {
        let state = state();
        assert_eq!(state.placed_items().len(), 25);
        assert!(state.placed_items().iter().all(|item| item.position.is_some()));
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history().checkpoints()[0].name, INITIAL_CHECKPOINT);
        assert_eq!(state.title(), DEFAULT_TITLE);
    }

    #[test]
    fn positions_survive_unrelated_updates() {
        let mut state = state();
        let before = state.placed_items().to_vec();
        state.set_title("Q3 Radar");
        state.hover_bubble(before[0].id, 1.0, 2.0);
        state.leave_bubble();
        state.dismiss_error();
        assert_eq!(state.placed_items(), before.as_slice());
    }

    #[test]
    fn successful_import_replaces_items_and_records_history() {
        let mut state = state();
        state.begin_import();
        assert!(state.is_importing());
        assert!(state.complete_import(Path::new("/tmp/signals.csv"), Ok(imported())));

        assert!(!state.is_importing());
        assert_eq!(state.items().len(), 2);
        assert!(state.groups().contains_key(&Category::Macro));
        assert!(!state.groups().contains_key(&Category::Buyer));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.history().checkpoints()[1].name, "Imported signals.csv");
        assert_eq!(state.history().active_index(), Some(1));
    }

    #[test]
    fn failed_import_keeps_previous_items() {
        let mut state = state();
        let before = state.placed_items().to_vec();
        state.begin_import();
        let applied = state.complete_import(
            Path::new("bad.csv"),
            Err(ImportError::MissingColumns { row: 3 }),
        );

        assert!(!applied);
        assert_eq!(state.placed_items(), before.as_slice());
        assert_eq!(
            state.error(),
            Some("Row 3 is missing required columns (id, text, category, impact).")
        );
        assert_eq!(state.history().len(), 1);

        state.begin_import();
        assert_eq!(state.error(), None);
        state.fail_import("Failed to read the file.");
        assert_eq!(state.error(), Some("Failed to read the file."));
        assert!(!state.is_importing());
    }

    #[test]
    fn tooltip_follows_hover_lifecycle() {
        let mut state = state();
        let item = state.placed_items()[3].clone();

        state.track_pointer(Some(item.id), 10.0, 20.0);
        let tooltip = state.tooltip().unwrap();
        assert_eq!(tooltip.content, item.text);
        assert_eq!((tooltip.x, tooltip.y), (10.0, 20.0));

        state.track_pointer(Some(item.id), 12.0, 21.0);
        let tooltip = state.tooltip().unwrap();
        assert_eq!(tooltip.content, item.text);
        assert_eq!((tooltip.x, tooltip.y), (12.0, 21.0));

        state.track_pointer(None, 40.0, 40.0);
        assert!(state.tooltip().is_none());

        state.move_pointer(1.0, 1.0);
        assert!(state.tooltip().is_none());
    }

    #[test]
    fn stale_insight_results_are_dropped() {
        let mut state = state();
        let first = state.select_item(1).unwrap();
        assert!(state.insight().unwrap().is_loading());
        let second = state.select_item(2).unwrap();

        assert!(!state.resolve_insight(first, "old".into()));
        assert!(state.insight().unwrap().is_loading());
        assert_eq!(state.insight().unwrap().item.id, 2);

        assert!(state.resolve_insight(second, "fresh".into()));
        assert_eq!(
            state.insight().unwrap().status,
            InsightStatus::Ready("fresh".into())
        );

        state.close_insight();
        assert!(!state.resolve_insight(second, "late".into()));
        assert!(state.insight().is_none());
        assert!(state.select_item(9999).is_none());
    }

    #[test]
    fn exports_are_mutually_exclusive() {
        let mut state = state();
        let ticket = state.begin_export(ExportKind::Pdf).unwrap();
        assert_eq!(ticket.kind, ExportKind::Pdf);
        assert_eq!(ticket.snapshot.items.len(), 25);

        assert!(state.begin_export(ExportKind::Png).is_none());
        assert!(state.begin_export(ExportKind::Pdf).is_none());
        assert_eq!(state.export_in_flight(), Some(ExportKind::Pdf));

        state.finish_export(
            ExportKind::Pdf,
            Err(ExportError::Pdf("disk full".into())),
        );
        assert_eq!(state.export_in_flight(), None);
        assert_eq!(state.error(), Some("Could not generate PDF: could not build PDF: disk full"));

        assert!(state.begin_export(ExportKind::Png).is_some());
        state.finish_export(ExportKind::Png, Ok(PathBuf::from("market-context-radar.png")));
        assert_eq!(state.last_export(), Some(Path::new("market-context-radar.png")));
    }

    #[test]
    fn blank_edits_keep_previous_value() {
        let mut state = state();
        assert!(!state.set_title("   "));
        assert_eq!(state.title(), DEFAULT_TITLE);
        assert!(state.set_title("  Q3 Outlook  "));
        assert_eq!(state.title(), "Q3 Outlook");
        assert!(state.set_subtitle("Watch list"));
        assert_eq!(state.subtitle(), "Watch list");
    }

    #[test]
    fn revert_restores_exact_positions() {
        let mut state = state();
        let initial = state.placed_items().to_vec();
        state.complete_import(Path::new("next.xlsx"), Ok(imported()));
        assert_eq!(state.placed_items().len(), 2);

        assert!(state.revert_to(0).unwrap());
        assert_eq!(state.placed_items(), initial.as_slice());
        assert!(!state.revert_to(0).unwrap());
        assert!(state.revert_to(7).is_err());
    }

    #[test]
    fn explicit_positions_are_kept() {
        let pinned = MarketItem::new(5, "pinned", Category::Buyer, Impact::Medium)
            .with_position(Position::new(30.0, 30.0));
        let state = RadarState::new(Arc::new(RadarConfig::default()), vec![pinned.clone()], 1);
        assert_eq!(state.placed_items(), &[pinned]);
    }

    #[test]
    fn blank_checkpoint_names_are_numbered() {
        let mut state = state();
        let index = state.save_checkpoint("  ");
        assert_eq!(state.history().checkpoints()[index].name, "Checkpoint 2");
        let named = state.save_checkpoint("Board review");
        assert_eq!(state.history().checkpoints()[named].name, "Board review");
    }
}
