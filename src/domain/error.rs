//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors and by service
//! operations when a domain invariant would be violated. Validation errors
//! carry the offending value; conflict errors carry the identities involved.

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    /// Exchange rates must be strictly positive.
    #[error("rate must be positive, got buy={buy} sell={sell}")]
    NonPositiveRate {
        buy: rust_decimal::Decimal,
        sell: rust_decimal::Decimal,
    },

    /// Transaction amounts must be strictly positive.
    #[error("transaction amount must be positive, got {amount}")]
    NonPositiveAmount { amount: rust_decimal::Decimal },

    /// A user cannot refer themselves.
    #[error("user {user_id} cannot be their own referrer")]
    SelfReferral { user_id: String },

    /// A referred user keeps their first referrer forever.
    #[error("user {referred_id} is already referred by {existing_referrer}")]
    AlreadyReferred {
        referred_id: String,
        existing_referrer: String,
    },

    /// Both sides of a referral must be present, non-empty ids.
    #[error("missing user id: {field}")]
    MissingUserId { field: &'static str },

    /// Commission shares must sum to exactly 1.
    #[error("commission shares must sum to 1, got {sum}")]
    InvalidShareSplit { sum: rust_decimal::Decimal },

    /// The acting user is not in the admin allowlist.
    #[error("user {user_id} is not authorized for admin operations")]
    Unauthorized { user_id: String },
}

impl DomainError {
    /// Conflict errors reject an operation that must not be retried as-is;
    /// validation errors reject malformed input.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::SelfReferral { .. } | DomainError::AlreadyReferred { .. }
        )
    }
}
