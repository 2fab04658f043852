//! Persistence layer with pluggable storage backends.
//!
//! Three ports cover the persisted collections: the current rate snapshot
//! plus its change history, the referral graph, and the per-beneficiary
//! commission ledger. Production uses the Diesel/SQLite backend; tests use
//! [`MemoryStore`], which implements all three ports.

pub mod db;
mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteCommissionLedger, SqliteRateStore, SqliteReferralStore};

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    CommissionEntry, RateHistoryEntry, RateSnapshot, ReferralEdge, ReferredUser, UserId,
};
use crate::error::Result;

/// A ledger append addressed to one beneficiary.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionCredit {
    pub beneficiary: UserId,
    pub entry: CommissionEntry,
}

/// Storage for the current rate snapshot and its append-only history.
pub trait RateStore: Send + Sync {
    /// The snapshot currently in force, if one was ever set.
    fn current(&self) -> impl Future<Output = Result<Option<RateSnapshot>>> + Send;

    /// Seed the initial snapshot. Only valid when none exists yet.
    fn init_current(&self, snapshot: &RateSnapshot) -> impl Future<Output = Result<()>> + Send;

    /// Atomically retire the current snapshot into history (attributed to
    /// `editor` at `at`) and replace it with `new`. When no snapshot exists
    /// yet, behaves like [`RateStore::init_current`].
    fn swap_current(
        &self,
        new: &RateSnapshot,
        editor: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// History entries, newest first, optionally limited.
    fn history(
        &self,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<RateHistoryEntry>>> + Send;

    /// Drop history entries beyond the newest `keep`. Returns count deleted.
    fn prune_history(&self, keep: usize) -> impl Future<Output = Result<usize>> + Send;
}

/// Storage for the write-once referral graph.
pub trait ReferralStore: Send + Sync {
    /// Insert the edge if no edge exists for its referred user yet.
    ///
    /// This is the compare-and-set that makes edges write-once: returns
    /// `true` if the edge was written, `false` if the referred user already
    /// had one (the store is unchanged in that case).
    fn insert_edge(&self, edge: &ReferralEdge) -> impl Future<Output = Result<bool>> + Send;

    /// The edge for a referred user, if any.
    fn edge(&self, referred: &UserId) -> impl Future<Output = Result<Option<ReferralEdge>>> + Send;

    /// All first-line referrals of `referrer`. Does not recurse.
    fn downstream(
        &self,
        referrer: &UserId,
    ) -> impl Future<Output = Result<Vec<ReferredUser>>> + Send;

    /// Total number of edges in the graph.
    fn count_edges(&self) -> impl Future<Output = Result<u64>> + Send;
}

/// Storage for the append-only commission ledger.
pub trait CommissionLedger: Send + Sync {
    /// Append all credits atomically: either every row lands or none do.
    ///
    /// Appends are idempotent per (transaction, level, beneficiary); credits
    /// already present are skipped. Returns the number of rows newly
    /// written, so a clean first application reports `credits.len()` and a
    /// full retry reports 0.
    fn append_all(&self, credits: &[CommissionCredit])
        -> impl Future<Output = Result<usize>> + Send;

    /// A beneficiary's ledger in insertion order.
    fn entries(
        &self,
        beneficiary: &UserId,
    ) -> impl Future<Output = Result<Vec<CommissionEntry>>> + Send;

    /// Sum of a beneficiary's ledger.
    fn total(&self, beneficiary: &UserId) -> impl Future<Output = Result<Decimal>> + Send;

    /// Sum over every beneficiary's ledger.
    fn total_all(&self) -> impl Future<Output = Result<Decimal>> + Send;

    /// Sum over all entries with `timestamp >= cutoff`.
    fn total_since(&self, cutoff: DateTime<Utc>) -> impl Future<Output = Result<Decimal>> + Send;
}
