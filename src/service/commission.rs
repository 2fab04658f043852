//! Commission distribution over the referral chain.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::domain::{
    CommissionEntry, CommissionShares, CommissionSplit, Line, Operation, TransactionId, UserId,
};
use crate::error::Result;
use crate::stores::{CommissionCredit, CommissionLedger, ReferralStore};

/// Commission parameters, validated once at construction.
#[derive(Debug, Clone, Copy)]
pub struct CommissionConfig {
    /// Fraction of each transaction that forms the commission pool.
    pub rate: Decimal,
    pub shares: CommissionShares,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            rate: Decimal::new(1, 2),
            shares: CommissionShares::default(),
        }
    }
}

impl CommissionConfig {
    /// # Errors
    /// Rejects a non-positive commission rate or shares that do not sum
    /// to exactly 1.
    pub fn validate(&self) -> Result<()> {
        if self.rate <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount: self.rate }.into());
        }
        self.shares.validate()?;
        Ok(())
    }
}

/// The result of distributing one transaction's commission.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DistributionOutcome {
    pub transaction_id: TransactionId,
    /// Full computed amounts, including shares of lines that do not exist.
    pub split: CommissionSplit,
    /// Rows actually appended to the ledger. Zero both for users with no
    /// referral chain and for retries of an already-applied transaction.
    pub entries_written: usize,
}

/// Splits each transaction's commission pool across the referral chain and
/// the platform, appending ledger entries for the lines that exist.
pub struct CommissionDistributor<R: ReferralStore, L: CommissionLedger> {
    referrals: R,
    ledger: L,
    config: CommissionConfig,
}

impl<R: ReferralStore, L: CommissionLedger> CommissionDistributor<R, L> {
    /// # Errors
    /// Fails when the configured shares or rate are invalid; the split
    /// invariant is checked here, before any transaction is processed.
    pub fn new(referrals: R, ledger: L, config: CommissionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            referrals,
            ledger,
            config,
        })
    }

    /// Distribute the commission for a completed transaction.
    ///
    /// Returns `None` for a non-positive amount or missing user id: both
    /// signal a caller bug upstream and are logged, not retried. Otherwise
    /// the pool `amount * rate` is split 30/40/20/10 between platform and
    /// lines; each existing line gets a ledger entry. A missing line's
    /// share is forfeited, not redistributed.
    ///
    /// All appends for one call land atomically, keyed by
    /// `(transaction, level, beneficiary)`; re-invoking with the same
    /// `transaction_id` after a persistence failure is safe and never
    /// double-counts.
    pub async fn distribute(
        &self,
        user: &UserId,
        amount: Decimal,
        operation: Operation,
        transaction_id: Option<TransactionId>,
    ) -> Result<Option<DistributionOutcome>> {
        if user.is_empty() {
            warn!("distribute called without a user id");
            return Ok(None);
        }
        if amount <= Decimal::ZERO {
            warn!(user = %user, amount = %amount, "distribute called with non-positive amount");
            return Ok(None);
        }

        let transaction_id = transaction_id.unwrap_or_default();
        let pool = amount * self.config.rate;

        let Some(edge) = self.referrals.edge(user).await? else {
            // No referral chain: the whole pool is the platform's, and
            // nothing is written to the ledger.
            info!(user = %user, pool = %pool, "no referral chain, pool attributed to platform");
            return Ok(Some(DistributionOutcome {
                transaction_id,
                split: CommissionSplit {
                    platform: pool,
                    first_line: Decimal::ZERO,
                    second_line: Decimal::ZERO,
                    third_line: Decimal::ZERO,
                    total: pool,
                },
                entries_written: 0,
            }));
        };

        let split = CommissionSplit {
            platform: pool * self.config.shares.platform,
            first_line: pool * self.config.shares.first_line,
            second_line: pool * self.config.shares.second_line,
            third_line: pool * self.config.shares.third_line,
            total: pool,
        };

        let timestamp = Utc::now();
        let mut credits = Vec::with_capacity(3);
        for line in [Line::First, Line::Second, Line::Third] {
            if let Some(beneficiary) = edge.beneficiary(line) {
                credits.push(CommissionCredit {
                    beneficiary: beneficiary.clone(),
                    entry: CommissionEntry {
                        amount: pool * self.config.shares.share_for(line),
                        from_user_id: user.clone(),
                        level: line,
                        operation,
                        transaction_id: transaction_id.clone(),
                        timestamp,
                    },
                });
            }
        }

        let entries_written = self.ledger.append_all(&credits).await?;
        info!(
            user = %user,
            transaction = %transaction_id,
            pool = %pool,
            credits = credits.len(),
            written = entries_written,
            "commission distributed"
        );

        Ok(Some(DistributionOutcome {
            transaction_id,
            split,
            entries_written,
        }))
    }
}
