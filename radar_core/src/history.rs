use chrono::Utc;
use radar_schema::{HistoryCheckpoint, MarketItem};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("checkpoint {index} does not exist ({len} recorded)")]
    UnknownCheckpoint { index: usize, len: usize },
}

/// Append-only log of item-set versions for the current session.
#[derive(Debug, Clone, Default)]
pub struct History {
    checkpoints: Vec<HistoryCheckpoint>,
    active: Option<usize>,
}

impl History {
    /// Record a copy of `items` and make it the active checkpoint.
    pub fn record(&mut self, name: impl Into<String>, items: &[MarketItem]) -> usize {
        self.checkpoints.push(HistoryCheckpoint {
            name: name.into(),
            timestamp: Utc::now(),
            items: items.to_vec(),
        });
        let index = self.checkpoints.len() - 1;
        self.active = Some(index);
        index
    }

    /// Copy of the items stored at `index`, or `None` when it is already active.
    pub fn revert(&mut self, index: usize) -> Result<Option<Vec<MarketItem>>, HistoryError> {
        let checkpoint = self
            .checkpoints
            .get(index)
            .ok_or(HistoryError::UnknownCheckpoint {
                index,
                len: self.checkpoints.len(),
            })?;
        if self.active == Some(index) {
            return Ok(None);
        }
        let items = checkpoint.items.clone();
        self.active = Some(index);
        Ok(Some(items))
    }

    pub fn checkpoints(&self) -> &[HistoryCheckpoint] {
        &self.checkpoints
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}
