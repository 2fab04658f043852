//! Builders for domain primitives used across tests.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::{
    CommissionEntry, Line, Operation, RateSnapshot, ReferralEdge, TransactionId, UserId,
};
use crate::stores::CommissionCredit;

/// A positive rate pair; panics on invalid input, which is fine in tests.
#[must_use]
pub fn snapshot(buy: Decimal, sell: Decimal) -> RateSnapshot {
    RateSnapshot::try_new(buy, sell).expect("test snapshot must be valid")
}

/// A bare edge with no upstream chain.
#[must_use]
pub fn edge(referrer: &str, referred: &str) -> ReferralEdge {
    ReferralEdge {
        referred_id: UserId::new(referred),
        referrer_id: UserId::new(referrer),
        second_line_id: None,
        third_line_id: None,
        date_added: Utc::now(),
    }
}

/// A first-line buy credit for `beneficiary`, keyed by `tx`.
#[must_use]
pub fn credit(beneficiary: &str, tx: &str, amount: Decimal) -> CommissionCredit {
    CommissionCredit {
        beneficiary: UserId::new(beneficiary),
        entry: CommissionEntry {
            amount,
            from_user_id: UserId::new("trader"),
            level: Line::First,
            operation: Operation::Buy,
            transaction_id: TransactionId::from(tx),
            timestamp: Utc::now(),
        },
    }
}
