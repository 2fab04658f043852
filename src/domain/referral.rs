//! Referral graph and commission domain types.
//!
//! A [`ReferralEdge`] is written once per referred user and never changed,
//! carrying the upstream chain as it looked at creation time. Commission
//! amounts credited to beneficiaries are [`CommissionEntry`] records in an
//! append-only per-user ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{TransactionId, UserId};

/// The direction of an exchange transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Buy,
    Sell,
}

impl Operation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Buy => "buy",
            Operation::Sell => "sell",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Operation::Buy),
            "sell" => Ok(Operation::Sell),
            other => Err(format!("unknown operation '{other}', expected buy or sell")),
        }
    }
}

/// Position in the referral chain relative to the transacting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Line {
    First = 1,
    Second = 2,
    Third = 3,
}

impl Line {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Parse a persisted level back into a `Line`.
    pub fn from_i32(level: i32) -> Result<Self, String> {
        match level {
            1 => Ok(Line::First),
            2 => Ok(Line::Second),
            3 => Ok(Line::Third),
            other => Err(format!("invalid referral line {other}")),
        }
    }
}

/// The write-once "referred by" fact for a single user.
///
/// `second_line_id` and `third_line_id` are snapshots of the chain at
/// creation time, not live pointers. The chain is truncated at depth 3 no
/// matter how deep the true ancestry goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralEdge {
    pub referred_id: UserId,
    pub referrer_id: UserId,
    pub second_line_id: Option<UserId>,
    pub third_line_id: Option<UserId>,
    pub date_added: DateTime<Utc>,
}

impl ReferralEdge {
    /// The beneficiary for a given line, if that line exists.
    #[must_use]
    pub fn beneficiary(&self, line: Line) -> Option<&UserId> {
        match line {
            Line::First => Some(&self.referrer_id),
            Line::Second => self.second_line_id.as_ref(),
            Line::Third => self.third_line_id.as_ref(),
        }
    }
}

/// A first-line referral as seen from the referrer's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferredUser {
    pub referred_id: UserId,
    pub date_added: DateTime<Utc>,
}

/// One credited commission in a beneficiary's ledger. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub amount: Decimal,
    /// The transacting user whose trade generated this commission.
    pub from_user_id: UserId,
    pub level: Line,
    pub operation: Operation,
    /// The transaction this entry belongs to; appends are idempotent per
    /// (transaction, level, beneficiary).
    pub transaction_id: TransactionId,
    pub timestamp: DateTime<Utc>,
}

/// How the commission pool is divided between the platform and the chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionShares {
    pub platform: Decimal,
    pub first_line: Decimal,
    pub second_line: Decimal,
    pub third_line: Decimal,
}

impl CommissionShares {
    /// The shares must partition the pool exactly.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidShareSplit`] if the four shares do not
    /// sum to exactly 1.
    pub fn validate(&self) -> Result<(), DomainError> {
        let sum = self.platform + self.first_line + self.second_line + self.third_line;
        if sum != Decimal::ONE {
            return Err(DomainError::InvalidShareSplit { sum });
        }
        Ok(())
    }

    #[must_use]
    pub fn share_for(&self, line: Line) -> Decimal {
        match line {
            Line::First => self.first_line,
            Line::Second => self.second_line,
            Line::Third => self.third_line,
        }
    }
}

impl Default for CommissionShares {
    fn default() -> Self {
        Self {
            platform: Decimal::new(30, 2),
            first_line: Decimal::new(40, 2),
            second_line: Decimal::new(20, 2),
            third_line: Decimal::new(10, 2),
        }
    }
}

/// The computed division of one transaction's commission pool.
///
/// Reported in full even when some lines do not exist and therefore received
/// no ledger entry, so callers can reconcile forfeited amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub platform: Decimal,
    pub first_line: Decimal,
    pub second_line: Decimal,
    pub third_line: Decimal,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_shares_sum_to_one() {
        assert!(CommissionShares::default().validate().is_ok());
    }

    #[test]
    fn unbalanced_shares_are_rejected() {
        let shares = CommissionShares {
            platform: dec!(0.5),
            first_line: dec!(0.4),
            second_line: dec!(0.2),
            third_line: dec!(0.1),
        };
        let err = shares.validate().unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidShareSplit { sum } if sum == dec!(1.2)
        ));
    }

    #[test]
    fn operation_round_trips_through_str() {
        assert_eq!("buy".parse::<Operation>().unwrap(), Operation::Buy);
        assert_eq!("sell".parse::<Operation>().unwrap(), Operation::Sell);
        assert_eq!(Operation::Sell.as_str(), "sell");
        assert!("hold".parse::<Operation>().is_err());
    }

    #[test]
    fn line_round_trips_through_i32() {
        for line in [Line::First, Line::Second, Line::Third] {
            assert_eq!(Line::from_i32(line.as_i32()).unwrap(), line);
        }
        assert!(Line::from_i32(4).is_err());
    }

    #[test]
    fn beneficiary_follows_the_chain() {
        let edge = ReferralEdge {
            referred_id: UserId::new("d"),
            referrer_id: UserId::new("c"),
            second_line_id: Some(UserId::new("b")),
            third_line_id: None,
            date_added: Utc::now(),
        };
        assert_eq!(edge.beneficiary(Line::First).unwrap().as_str(), "c");
        assert_eq!(edge.beneficiary(Line::Second).unwrap().as_str(), "b");
        assert!(edge.beneficiary(Line::Third).is_none());
    }
}
