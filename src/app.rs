//! Application wiring: pool construction and service factories.

use crate::config::Config;
use crate::error::Result;
use crate::service::{
    AdminDirectory, CommissionDistributor, QueryService, RateService, ReferralRegistry,
};
use crate::stores::db::{create_pool, run_migrations, DbPool};
use crate::stores::{SqliteCommissionLedger, SqliteRateStore, SqliteReferralStore};

/// Owns the connection pool and hands out services over it.
pub struct App {
    config: Config,
    pool: DbPool,
}

impl App {
    /// Open (or create) the database and run pending migrations.
    pub fn new(config: Config) -> Result<Self> {
        let pool = create_pool(&config.database.url)?;
        run_migrations(&pool)?;
        Ok(Self { config, pool })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rate_service(&self) -> Result<RateService<SqliteRateStore>> {
        let default = self.config.default_rates()?;
        Ok(
            RateService::new(SqliteRateStore::new(self.pool.clone()), default)
                .with_retention(self.config.rates.history_retention),
        )
    }

    #[must_use]
    pub fn referral_registry(&self) -> ReferralRegistry<SqliteReferralStore> {
        ReferralRegistry::new(SqliteReferralStore::new(self.pool.clone()))
    }

    pub fn commission_distributor(
        &self,
    ) -> Result<CommissionDistributor<SqliteReferralStore, SqliteCommissionLedger>> {
        CommissionDistributor::new(
            SqliteReferralStore::new(self.pool.clone()),
            SqliteCommissionLedger::new(self.pool.clone()),
            self.config.commission.to_commission_config(),
        )
    }

    #[must_use]
    pub fn query_service(&self) -> QueryService<SqliteReferralStore, SqliteCommissionLedger> {
        QueryService::new(
            SqliteReferralStore::new(self.pool.clone()),
            SqliteCommissionLedger::new(self.pool.clone()),
        )
    }

    #[must_use]
    pub fn admin_directory(&self) -> AdminDirectory {
        AdminDirectory::new(self.config.admin.user_ids())
    }
}
