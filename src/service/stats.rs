//! Read-side queries over the referral graph and commission ledger.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{CommissionEntry, UserId};
use crate::error::Result;
use crate::stores::{CommissionLedger, ReferralStore};

/// Aggregate figures for the whole referral program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralStats {
    pub total_referrals: u64,
    pub total_commissions_amount: Decimal,
    pub last_30_days_commissions: Decimal,
}

/// Pure read/aggregation over the two stores; no state of its own.
pub struct QueryService<R: ReferralStore, L: CommissionLedger> {
    referrals: R,
    ledger: L,
}

impl<R: ReferralStore, L: CommissionLedger> QueryService<R, L> {
    pub fn new(referrals: R, ledger: L) -> Self {
        Self { referrals, ledger }
    }

    /// A user's commission ledger in insertion order.
    pub async fn get_user_commissions(&self, user: &UserId) -> Result<Vec<CommissionEntry>> {
        self.ledger.entries(user).await
    }

    /// Sum of a user's commission ledger.
    pub async fn get_total_commissions(&self, user: &UserId) -> Result<Decimal> {
        self.ledger.total(user).await
    }

    /// Program-wide referral and commission aggregates.
    pub async fn get_referral_stats(&self) -> Result<ReferralStats> {
        let cutoff = Utc::now() - Duration::days(30);
        Ok(ReferralStats {
            total_referrals: self.referrals.count_edges().await?,
            total_commissions_amount: self.ledger.total_all().await?,
            last_30_days_commissions: self.ledger.total_since(cutoff).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Line, Operation, TransactionId};
    use crate::service::referral::ReferralRegistry;
    use crate::stores::{CommissionCredit, MemoryStore};
    use rust_decimal_macros::dec;

    fn credit(beneficiary: &str, tx: &str, amount: Decimal, days_ago: i64) -> CommissionCredit {
        CommissionCredit {
            beneficiary: UserId::new(beneficiary),
            entry: CommissionEntry {
                amount,
                from_user_id: UserId::new("trader"),
                level: Line::First,
                operation: Operation::Buy,
                transaction_id: TransactionId::from(tx),
                timestamp: Utc::now() - Duration::days(days_ago),
            },
        }
    }

    #[tokio::test]
    async fn user_ledger_and_total_agree() {
        let store = MemoryStore::new();
        store
            .append_all(&[
                credit("u1", "tx-1", dec!(4), 0),
                credit("u1", "tx-2", dec!(2), 0),
            ])
            .await
            .unwrap();

        let service = QueryService::new(store.clone(), store);
        let entries = service
            .get_user_commissions(&UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transaction_id.as_str(), "tx-1");

        let total = service
            .get_total_commissions(&UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(total, dec!(6));
    }

    #[tokio::test]
    async fn unknown_user_has_empty_ledger_and_zero_total() {
        let store = MemoryStore::new();
        let service = QueryService::new(store.clone(), store);

        let entries = service
            .get_user_commissions(&UserId::new("nobody"))
            .await
            .unwrap();
        assert!(entries.is_empty());
        assert_eq!(
            service
                .get_total_commissions(&UserId::new("nobody"))
                .await
                .unwrap(),
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn stats_aggregate_graph_and_ledger() {
        let store = MemoryStore::new();
        let registry = ReferralRegistry::new(store.clone());
        registry
            .add_referral(&UserId::new("a"), &UserId::new("b"))
            .await
            .unwrap();
        registry
            .add_referral(&UserId::new("a"), &UserId::new("c"))
            .await
            .unwrap();

        store
            .append_all(&[
                credit("a", "tx-old", dec!(5), 45),
                credit("a", "tx-new", dec!(3), 1),
            ])
            .await
            .unwrap();

        let service = QueryService::new(store.clone(), store);
        let stats = service.get_referral_stats().await.unwrap();
        assert_eq!(stats.total_referrals, 2);
        assert_eq!(stats.total_commissions_amount, dec!(8));
        assert_eq!(stats.last_30_days_commissions, dec!(3));
    }
}
