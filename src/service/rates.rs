//! Rate snapshot service: the single writer over current rates and history.

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use super::auth::AdminToken;
use crate::domain::{RateHistoryEntry, RateSnapshot};
use crate::error::Result;
use crate::stores::RateStore;
use rust_decimal::Decimal;

/// Default retention for superseded snapshots.
pub const DEFAULT_HISTORY_RETENTION: usize = 100;

/// Owns the current rate pair and its audit history.
///
/// The read-old/append-history/write-new sequence of an update is one
/// critical section; a lost update would leave a hole in the audit trail,
/// so updates are serialized through an async mutex on top of the store's
/// own transactional swap.
pub struct RateService<S: RateStore> {
    store: S,
    default: RateSnapshot,
    retention: usize,
    update_lock: Mutex<()>,
}

impl<S: RateStore> RateService<S> {
    /// Create a service over `store`. `default` is persisted as the initial
    /// snapshot on first read if none exists.
    pub fn new(store: S, default: RateSnapshot) -> Self {
        Self {
            store,
            default,
            retention: DEFAULT_HISTORY_RETENTION,
            update_lock: Mutex::new(()),
        }
    }

    /// Override the history retention cap.
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    /// The snapshot currently in force, seeding the default if none exists.
    pub async fn get_current(&self) -> Result<RateSnapshot> {
        if let Some(current) = self.store.current().await? {
            return Ok(current);
        }
        self.store.init_current(&self.default).await?;
        // Re-read: a concurrent seed may have won.
        Ok(self.store.current().await?.unwrap_or(self.default))
    }

    /// Replace the current rates.
    ///
    /// Validates positivity, retires the outgoing snapshot into history
    /// attributed to the token holder, and returns the new snapshot.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveRate`](crate::domain::error::DomainError::NonPositiveRate)
    /// for non-positive input, or a persistence error from the store.
    pub async fn update_rates(
        &self,
        buy: Decimal,
        sell: Decimal,
        admin: &AdminToken,
    ) -> Result<RateSnapshot> {
        let new = RateSnapshot::try_new(buy, sell)?;

        let _guard = self.update_lock.lock().await;
        // Make sure the first ever update still retires a snapshot.
        self.get_current().await?;
        self.store
            .swap_current(&new, admin.editor(), Utc::now())
            .await?;
        self.store.prune_history(self.retention).await?;

        info!(buy = %buy, sell = %sell, editor = admin.editor(), "rates updated");
        Ok(new)
    }

    /// Rate change history, newest first.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<RateHistoryEntry>> {
        self.store.history(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::UserId;
    use crate::error::Error;
    use crate::service::auth::AdminDirectory;
    use crate::stores::MemoryStore;
    use rust_decimal_macros::dec;

    fn admin() -> AdminToken {
        AdminDirectory::new([UserId::new("admin")])
            .authorize(&UserId::new("admin"))
            .unwrap()
    }

    #[tokio::test]
    async fn first_read_seeds_the_default() {
        let default = RateSnapshot::try_new(dec!(80.5), dec!(78.0)).unwrap();
        let service = RateService::new(MemoryStore::new(), default);

        assert_eq!(service.get_current().await.unwrap(), default);
        // Seeding is not an update: no history entry.
        assert!(service.history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_returns_new_and_retires_previous() {
        let default = RateSnapshot::try_new(dec!(80.5), dec!(78.0)).unwrap();
        let service = RateService::new(MemoryStore::new(), default);

        let updated = service
            .update_rates(dec!(96.5), dec!(95.0), &admin())
            .await
            .unwrap();
        assert_eq!(updated.buy_rate, dec!(96.5));
        assert_eq!(service.get_current().await.unwrap(), updated);

        let history = service.history(None).await.unwrap();
        assert_eq!(history[0].snapshot(), default);
        assert_eq!(history[0].editor, "admin");
    }

    #[tokio::test]
    async fn non_positive_rates_are_rejected_without_writes() {
        let default = RateSnapshot::try_new(dec!(80.5), dec!(78.0)).unwrap();
        let service = RateService::new(MemoryStore::new(), default);

        let err = service
            .update_rates(dec!(0), dec!(95.0), &admin())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::NonPositiveRate { .. })
        ));
        assert!(service.history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_capped_at_retention() {
        let default = RateSnapshot::try_new(dec!(1), dec!(1)).unwrap();
        let service = RateService::new(MemoryStore::new(), default).with_retention(2);

        for i in 2..=5 {
            service
                .update_rates(Decimal::from(i), Decimal::from(i), &admin())
                .await
                .unwrap();
        }

        let history = service.history(None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].buy_rate, dec!(4));
        assert_eq!(history[1].buy_rate, dec!(3));
    }

    #[tokio::test]
    async fn history_limit_returns_newest_first() {
        let default = RateSnapshot::try_new(dec!(1), dec!(1)).unwrap();
        let service = RateService::new(MemoryStore::new(), default);

        service
            .update_rates(dec!(2), dec!(2), &admin())
            .await
            .unwrap();
        service
            .update_rates(dec!(3), dec!(3), &admin())
            .await
            .unwrap();

        let history = service.history(Some(1)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].buy_rate, dec!(2));
    }
}
