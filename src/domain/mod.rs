//! Exchange-agnostic domain types for the referral and rate ledgers.

pub mod error;
mod id;
mod rates;
mod referral;

pub use id::{TransactionId, UserId};
pub use rates::{RateHistoryEntry, RateSnapshot};
pub use referral::{
    CommissionEntry, CommissionShares, CommissionSplit, Line, Operation, ReferralEdge,
    ReferredUser,
};
