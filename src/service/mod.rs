//! Application services over the store ports.

pub mod auth;
pub mod commission;
pub mod rates;
pub mod referral;
pub mod stats;

pub use auth::{AdminDirectory, AdminToken};
pub use commission::{CommissionConfig, CommissionDistributor, DistributionOutcome};
pub use rates::{RateService, DEFAULT_HISTORY_RETENTION};
pub use referral::{referral_code, referral_link, ReferralRegistry};
pub use stats::{QueryService, ReferralStats};
