//! SQLite store implementations using Diesel.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::db::model::{
    CommissionRow, NewCommissionRow, NewRateHistoryRow, RateHistoryRow, RateRow, ReferralRow,
};
use super::db::schema::{commissions, rates, rates_history, referrals};
use super::db::DbPool;
use super::{CommissionCredit, CommissionLedger, RateStore, ReferralStore};
use crate::domain::{
    CommissionEntry, Line, Operation, RateHistoryEntry, RateSnapshot, ReferralEdge, ReferredUser,
    TransactionId, UserId,
};
use crate::error::{Error, Result};

/// The `rates` table holds exactly one row under this id.
const CURRENT_RATES_ROW_ID: i32 = 1;

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|e| Error::Parse(e.to_string()))
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

/// SQLite-backed rate store.
#[derive(Clone)]
pub struct SqliteRateStore {
    pool: DbPool,
}

impl SqliteRateStore {
    /// Create a new SQLite rate store.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn snapshot_from_row(row: &RateRow) -> Result<RateSnapshot> {
        Ok(RateSnapshot {
            buy_rate: parse_decimal(&row.buy_rate)?,
            sell_rate: parse_decimal(&row.sell_rate)?,
        })
    }

    fn history_from_row(row: RateHistoryRow) -> Result<RateHistoryEntry> {
        Ok(RateHistoryEntry {
            id: i64::from(row.id.unwrap_or_default()),
            timestamp: parse_timestamp(&row.changed_at)?,
            editor: row.editor,
            buy_rate: parse_decimal(&row.buy_rate)?,
            sell_rate: parse_decimal(&row.sell_rate)?,
        })
    }
}

impl RateStore for SqliteRateStore {
    async fn current(&self) -> Result<Option<RateSnapshot>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<RateRow> = rates::table
            .find(CURRENT_RATES_ROW_ID)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.as_ref().map(Self::snapshot_from_row).transpose()
    }

    async fn init_current(&self, snapshot: &RateSnapshot) -> Result<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row = RateRow {
            id: CURRENT_RATES_ROW_ID,
            buy_rate: snapshot.buy_rate.to_string(),
            sell_rate: snapshot.sell_rate.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };

        // insert_or_ignore keeps a concurrent first read from failing: the
        // earlier seed wins.
        diesel::insert_or_ignore_into(rates::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn swap_current(&self, new: &RateSnapshot, editor: &str, at: DateTime<Utc>) -> Result<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let outgoing: Option<RateRow> = rates::table
                .find(CURRENT_RATES_ROW_ID)
                .first(conn)
                .optional()?;

            if let Some(old) = outgoing {
                let history_row = NewRateHistoryRow {
                    buy_rate: old.buy_rate,
                    sell_rate: old.sell_rate,
                    editor: editor.to_string(),
                    changed_at: at.to_rfc3339(),
                };
                diesel::insert_into(rates_history::table)
                    .values(&history_row)
                    .execute(conn)?;
            }

            let row = RateRow {
                id: CURRENT_RATES_ROW_ID,
                buy_rate: new.buy_rate.to_string(),
                sell_rate: new.sell_rate.to_string(),
                updated_at: at.to_rfc3339(),
            };
            diesel::replace_into(rates::table).values(&row).execute(conn)?;

            Ok(())
        })
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn history(&self, limit: Option<usize>) -> Result<Vec<RateHistoryEntry>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let query = rates_history::table.order(rates_history::id.desc());
        let rows: Vec<RateHistoryRow> = match limit {
            Some(n) => query
                .limit(n as i64)
                .load(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?,
            None => query
                .load(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?,
        };

        rows.into_iter().map(Self::history_from_row).collect()
    }

    async fn prune_history(&self, keep: usize) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let ids: Vec<Option<i32>> = rates_history::table
            .select(rates_history::id)
            .order(rates_history::id.desc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        if ids.len() <= keep {
            return Ok(0);
        }

        // The (keep+1)-th newest id and everything older gets deleted.
        let cutoff = ids[keep].unwrap_or_default();
        let deleted = diesel::delete(rates_history::table.filter(rates_history::id.le(cutoff)))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(deleted)
    }
}

/// SQLite-backed referral graph store.
#[derive(Clone)]
pub struct SqliteReferralStore {
    pool: DbPool,
}

impl SqliteReferralStore {
    /// Create a new SQLite referral store.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(edge: &ReferralEdge) -> ReferralRow {
        ReferralRow {
            referred_id: edge.referred_id.to_string(),
            referrer_id: edge.referrer_id.to_string(),
            second_line_id: edge.second_line_id.as_ref().map(ToString::to_string),
            third_line_id: edge.third_line_id.as_ref().map(ToString::to_string),
            date_added: edge.date_added.to_rfc3339(),
        }
    }

    fn from_row(row: ReferralRow) -> Result<ReferralEdge> {
        Ok(ReferralEdge {
            referred_id: UserId::from(row.referred_id),
            referrer_id: UserId::from(row.referrer_id),
            second_line_id: row.second_line_id.map(UserId::from),
            third_line_id: row.third_line_id.map(UserId::from),
            date_added: parse_timestamp(&row.date_added)?,
        })
    }
}

impl ReferralStore for SqliteReferralStore {
    async fn insert_edge(&self, edge: &ReferralEdge) -> Result<bool> {
        let row = Self::to_row(edge);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        // Primary key on referred_id makes this the compare-and-set: the row
        // lands only if no edge exists for the referred user yet.
        let inserted = diesel::insert_or_ignore_into(referrals::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    async fn edge(&self, referred: &UserId) -> Result<Option<ReferralEdge>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<ReferralRow> = referrals::table
            .find(referred.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Self::from_row).transpose()
    }

    async fn downstream(&self, referrer: &UserId) -> Result<Vec<ReferredUser>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<ReferralRow> = referrals::table
            .filter(referrals::referrer_id.eq(referrer.as_str()))
            .order(referrals::date_added.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(ReferredUser {
                    referred_id: UserId::from(row.referred_id),
                    date_added: parse_timestamp(&row.date_added)?,
                })
            })
            .collect()
    }

    async fn count_edges(&self) -> Result<u64> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let count: i64 = referrals::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(count.unsigned_abs())
    }
}

/// SQLite-backed commission ledger.
#[derive(Clone)]
pub struct SqliteCommissionLedger {
    pool: DbPool,
}

impl SqliteCommissionLedger {
    /// Create a new SQLite commission ledger.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(credit: &CommissionCredit) -> NewCommissionRow {
        NewCommissionRow {
            beneficiary_id: credit.beneficiary.to_string(),
            transaction_id: credit.entry.transaction_id.to_string(),
            from_user_id: credit.entry.from_user_id.to_string(),
            level: credit.entry.level.as_i32(),
            operation: credit.entry.operation.to_string(),
            amount: credit.entry.amount.to_string(),
            created_at: credit.entry.timestamp.to_rfc3339(),
        }
    }

    fn entry_from_row(row: CommissionRow) -> Result<CommissionEntry> {
        Ok(CommissionEntry {
            amount: parse_decimal(&row.amount)?,
            from_user_id: UserId::from(row.from_user_id),
            level: Line::from_i32(row.level).map_err(Error::Parse)?,
            operation: Operation::from_str(&row.operation).map_err(Error::Parse)?,
            transaction_id: TransactionId::from(row.transaction_id),
            timestamp: parse_timestamp(&row.created_at)?,
        })
    }

    fn sum_amounts(amounts: Vec<String>) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for amount in amounts {
            total += parse_decimal(&amount)?;
        }
        Ok(total)
    }
}

impl CommissionLedger for SqliteCommissionLedger {
    async fn append_all(&self, credits: &[CommissionCredit]) -> Result<usize> {
        let rows: Vec<NewCommissionRow> = credits.iter().map(Self::to_row).collect();
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        // One transaction for the whole batch: a failed append leaves no
        // partial credit behind. The unique (transaction, level,
        // beneficiary) index turns a retry into a no-op per row.
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let mut written = 0;
            for row in &rows {
                written += diesel::insert_or_ignore_into(commissions::table)
                    .values(row)
                    .execute(conn)?;
            }
            Ok(written)
        })
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn entries(&self, beneficiary: &UserId) -> Result<Vec<CommissionEntry>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<CommissionRow> = commissions::table
            .filter(commissions::beneficiary_id.eq(beneficiary.as_str()))
            .order(commissions::id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(Self::entry_from_row).collect()
    }

    async fn total(&self, beneficiary: &UserId) -> Result<Decimal> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let amounts: Vec<String> = commissions::table
            .filter(commissions::beneficiary_id.eq(beneficiary.as_str()))
            .select(commissions::amount)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Self::sum_amounts(amounts)
    }

    async fn total_all(&self) -> Result<Decimal> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let amounts: Vec<String> = commissions::table
            .select(commissions::amount)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Self::sum_amounts(amounts)
    }

    async fn total_since(&self, cutoff: DateTime<Utc>) -> Result<Decimal> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        // RFC 3339 UTC timestamps compare lexicographically in insert order.
        let cutoff = cutoff.to_rfc3339();
        let amounts: Vec<String> = commissions::table
            .filter(commissions::created_at.ge(&cutoff))
            .select(commissions::amount)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Self::sum_amounts(amounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::db::{create_pool, run_migrations, DbPool};
    use rust_decimal_macros::dec;

    fn setup_test_db() -> DbPool {
        let pool = create_pool(":memory:").expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        pool
    }

    fn edge(referred: &str, referrer: &str) -> ReferralEdge {
        ReferralEdge {
            referred_id: UserId::new(referred),
            referrer_id: UserId::new(referrer),
            second_line_id: None,
            third_line_id: None,
            date_added: Utc::now(),
        }
    }

    fn credit(beneficiary: &str, tx: &str, level: Line, amount: Decimal) -> CommissionCredit {
        CommissionCredit {
            beneficiary: UserId::new(beneficiary),
            entry: CommissionEntry {
                amount,
                from_user_id: UserId::new("trader"),
                level,
                operation: Operation::Buy,
                transaction_id: TransactionId::from(tx),
                timestamp: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn rate_store_swap_records_outgoing_snapshot() {
        let store = SqliteRateStore::new(setup_test_db());

        let first = RateSnapshot::try_new(dec!(80.5), dec!(78.0)).unwrap();
        store.init_current(&first).await.unwrap();

        let second = RateSnapshot::try_new(dec!(96.5), dec!(95.0)).unwrap();
        store
            .swap_current(&second, "admin", Utc::now())
            .await
            .unwrap();

        assert_eq!(store.current().await.unwrap(), Some(second));

        let history = store.history(None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].snapshot(), first);
        assert_eq!(history[0].editor, "admin");
    }

    #[tokio::test]
    async fn rate_store_prune_keeps_newest() {
        let store = SqliteRateStore::new(setup_test_db());

        let mut snapshot = RateSnapshot::try_new(dec!(1), dec!(1)).unwrap();
        store.init_current(&snapshot).await.unwrap();
        for i in 2..=6 {
            snapshot = RateSnapshot::try_new(Decimal::from(i), Decimal::from(i)).unwrap();
            store.swap_current(&snapshot, "admin", Utc::now()).await.unwrap();
        }

        let deleted = store.prune_history(3).await.unwrap();
        assert_eq!(deleted, 2);

        let history = store.history(None).await.unwrap();
        assert_eq!(history.len(), 3);
        // Newest first: the retired snapshots 5, 4, 3.
        assert_eq!(history[0].buy_rate, dec!(5));
        assert_eq!(history[2].buy_rate, dec!(3));
    }

    #[tokio::test]
    async fn referral_insert_is_compare_and_set() {
        let store = SqliteReferralStore::new(setup_test_db());

        assert!(store.insert_edge(&edge("b", "a")).await.unwrap());
        assert!(!store.insert_edge(&edge("b", "c")).await.unwrap());

        let kept = store.edge(&UserId::new("b")).await.unwrap().unwrap();
        assert_eq!(kept.referrer_id.as_str(), "a");
        assert_eq!(store.count_edges().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn referral_downstream_is_first_line_only() {
        let store = SqliteReferralStore::new(setup_test_db());

        store.insert_edge(&edge("b", "a")).await.unwrap();
        store.insert_edge(&edge("c", "a")).await.unwrap();
        store.insert_edge(&edge("d", "b")).await.unwrap();

        let downstream = store.downstream(&UserId::new("a")).await.unwrap();
        let ids: Vec<&str> = downstream.iter().map(|r| r.referred_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"b"));
        assert!(ids.contains(&"c"));
        assert!(!ids.contains(&"d"));
    }

    #[tokio::test]
    async fn ledger_append_is_idempotent_per_transaction() {
        let ledger = SqliteCommissionLedger::new(setup_test_db());

        let credits = vec![
            credit("u1", "tx-1", Line::First, dec!(4)),
            credit("u2", "tx-1", Line::Second, dec!(2)),
        ];

        assert_eq!(ledger.append_all(&credits).await.unwrap(), 2);
        // A full retry writes nothing new.
        assert_eq!(ledger.append_all(&credits).await.unwrap(), 0);

        assert_eq!(ledger.total(&UserId::new("u1")).await.unwrap(), dec!(4));
        assert_eq!(ledger.total_all().await.unwrap(), dec!(6));
    }

    #[tokio::test]
    async fn ledger_entries_preserve_insertion_order() {
        let ledger = SqliteCommissionLedger::new(setup_test_db());

        ledger
            .append_all(&[credit("u1", "tx-1", Line::First, dec!(1))])
            .await
            .unwrap();
        ledger
            .append_all(&[credit("u1", "tx-2", Line::First, dec!(2))])
            .await
            .unwrap();

        let entries = ledger.entries(&UserId::new("u1")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transaction_id.as_str(), "tx-1");
        assert_eq!(entries[1].transaction_id.as_str(), "tx-2");
    }

    #[tokio::test]
    async fn ledger_total_since_filters_by_timestamp() {
        let ledger = SqliteCommissionLedger::new(setup_test_db());

        let mut old = credit("u1", "tx-old", Line::First, dec!(5));
        old.entry.timestamp = Utc::now() - chrono::Duration::days(45);
        ledger.append_all(&[old]).await.unwrap();
        ledger
            .append_all(&[credit("u1", "tx-new", Line::First, dec!(3))])
            .await
            .unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(30);
        assert_eq!(ledger.total_since(cutoff).await.unwrap(), dec!(3));
        assert_eq!(ledger.total_all().await.unwrap(), dec!(8));
    }
}
