//! Exchange rate snapshot and history types.
//!
//! Exactly one [`RateSnapshot`] is current at any moment. Every update
//! supersedes it and turns the outgoing pair into a [`RateHistoryEntry`],
//! so the history is an append-only audit trail of who changed what, when.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// The buy/sell rate pair currently in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// RUB per USDT when the user buys USDT.
    pub buy_rate: Decimal,
    /// RUB per USDT when the user sells USDT.
    pub sell_rate: Decimal,
}

impl RateSnapshot {
    /// Create a snapshot, validating that both rates are strictly positive.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveRate`] if either rate is zero or
    /// negative.
    pub fn try_new(buy_rate: Decimal, sell_rate: Decimal) -> Result<Self, DomainError> {
        if buy_rate <= Decimal::ZERO || sell_rate <= Decimal::ZERO {
            return Err(DomainError::NonPositiveRate {
                buy: buy_rate,
                sell: sell_rate,
            });
        }
        Ok(Self {
            buy_rate,
            sell_rate,
        })
    }
}

/// A superseded rate snapshot, recorded at the moment it was replaced.
///
/// Immutable once written; ordered newest first when listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryEntry {
    /// Store-assigned id, monotonically increasing with insertion.
    pub id: i64,
    /// When the snapshot was replaced.
    pub timestamp: DateTime<Utc>,
    /// Who performed the update that retired this snapshot.
    pub editor: String,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
}

impl RateHistoryEntry {
    /// The retired rate pair.
    #[must_use]
    pub fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            buy_rate: self.buy_rate,
            sell_rate: self.sell_rate,
        }
    }
}
