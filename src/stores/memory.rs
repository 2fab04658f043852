//! In-memory store implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use super::{CommissionCredit, CommissionLedger, RateStore, ReferralStore};
use crate::domain::{
    CommissionEntry, RateHistoryEntry, RateSnapshot, ReferralEdge, ReferredUser, UserId,
};
use crate::error::Result;

#[derive(Debug, Default)]
struct Inner {
    current_rates: RwLock<Option<RateSnapshot>>,
    // Newest first, mirroring the persisted ordering.
    history: RwLock<Vec<RateHistoryEntry>>,
    next_history_id: RwLock<i64>,
    edges: RwLock<HashMap<UserId, ReferralEdge>>,
    ledgers: RwLock<HashMap<UserId, Vec<CommissionEntry>>>,
}

/// In-memory store for testing purposes. Implements all three ports.
///
/// Clones share state, so one store can back several services at once.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateStore for MemoryStore {
    async fn current(&self) -> Result<Option<RateSnapshot>> {
        Ok(*self.inner.current_rates.read())
    }

    async fn init_current(&self, snapshot: &RateSnapshot) -> Result<()> {
        let mut current = self.inner.current_rates.write();
        if current.is_none() {
            *current = Some(*snapshot);
        }
        Ok(())
    }

    async fn swap_current(&self, new: &RateSnapshot, editor: &str, at: DateTime<Utc>) -> Result<()> {
        let mut current = self.inner.current_rates.write();
        if let Some(old) = *current {
            let mut next_id = self.inner.next_history_id.write();
            *next_id += 1;
            self.inner.history.write().insert(
                0,
                RateHistoryEntry {
                    id: *next_id,
                    timestamp: at,
                    editor: editor.to_string(),
                    buy_rate: old.buy_rate,
                    sell_rate: old.sell_rate,
                },
            );
        }
        *current = Some(*new);
        Ok(())
    }

    async fn history(&self, limit: Option<usize>) -> Result<Vec<RateHistoryEntry>> {
        let history = self.inner.history.read();
        let take = limit.unwrap_or(history.len());
        Ok(history.iter().take(take).cloned().collect())
    }

    async fn prune_history(&self, keep: usize) -> Result<usize> {
        let mut history = self.inner.history.write();
        let before = history.len();
        history.truncate(keep);
        Ok(before - history.len())
    }
}

impl ReferralStore for MemoryStore {
    async fn insert_edge(&self, edge: &ReferralEdge) -> Result<bool> {
        let mut edges = self.inner.edges.write();
        if edges.contains_key(&edge.referred_id) {
            return Ok(false);
        }
        edges.insert(edge.referred_id.clone(), edge.clone());
        Ok(true)
    }

    async fn edge(&self, referred: &UserId) -> Result<Option<ReferralEdge>> {
        Ok(self.inner.edges.read().get(referred).cloned())
    }

    async fn downstream(&self, referrer: &UserId) -> Result<Vec<ReferredUser>> {
        let edges = self.inner.edges.read();
        let mut referred: Vec<ReferredUser> = edges
            .values()
            .filter(|e| &e.referrer_id == referrer)
            .map(|e| ReferredUser {
                referred_id: e.referred_id.clone(),
                date_added: e.date_added,
            })
            .collect();
        referred.sort_by_key(|r| r.date_added);
        Ok(referred)
    }

    async fn count_edges(&self) -> Result<u64> {
        Ok(self.inner.edges.read().len() as u64)
    }
}

impl CommissionLedger for MemoryStore {
    async fn append_all(&self, credits: &[CommissionCredit]) -> Result<usize> {
        let mut ledgers = self.inner.ledgers.write();
        let mut written = 0;
        for credit in credits {
            let entries = ledgers.entry(credit.beneficiary.clone()).or_default();
            let duplicate = entries.iter().any(|e| {
                e.transaction_id == credit.entry.transaction_id && e.level == credit.entry.level
            });
            if !duplicate {
                entries.push(credit.entry.clone());
                written += 1;
            }
        }
        Ok(written)
    }

    async fn entries(&self, beneficiary: &UserId) -> Result<Vec<CommissionEntry>> {
        Ok(self
            .inner
            .ledgers
            .read()
            .get(beneficiary)
            .cloned()
            .unwrap_or_default())
    }

    async fn total(&self, beneficiary: &UserId) -> Result<Decimal> {
        Ok(self
            .inner
            .ledgers
            .read()
            .get(beneficiary)
            .map(|entries| entries.iter().map(|e| e.amount).sum())
            .unwrap_or(Decimal::ZERO))
    }

    async fn total_all(&self) -> Result<Decimal> {
        Ok(self
            .inner
            .ledgers
            .read()
            .values()
            .flatten()
            .map(|e| e.amount)
            .sum())
    }

    async fn total_since(&self, cutoff: DateTime<Utc>) -> Result<Decimal> {
        Ok(self
            .inner
            .ledgers
            .read()
            .values()
            .flatten()
            .filter(|e| e.timestamp >= cutoff)
            .map(|e| e.amount)
            .sum())
    }
}
