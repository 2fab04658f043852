//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{commissions, rates, rates_history, referrals};

/// Database row for the current rate snapshot (single row, id = 1).
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RateRow {
    pub id: i32,
    pub buy_rate: String,
    pub sell_rate: String,
    pub updated_at: String,
}

/// Database row for a retired rate snapshot (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = rates_history)]
pub struct NewRateHistoryRow {
    pub buy_rate: String,
    pub sell_rate: String,
    pub editor: String,
    pub changed_at: String,
}

/// Database row for a retired rate snapshot (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = rates_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RateHistoryRow {
    pub id: Option<i32>,
    pub buy_rate: String,
    pub sell_rate: String,
    pub editor: String,
    pub changed_at: String,
}

/// Database row for a referral edge.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = referrals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReferralRow {
    pub referred_id: String,
    pub referrer_id: String,
    pub second_line_id: Option<String>,
    pub third_line_id: Option<String>,
    pub date_added: String,
}

/// Database row for a commission ledger entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = commissions)]
pub struct NewCommissionRow {
    pub beneficiary_id: String,
    pub transaction_id: String,
    pub from_user_id: String,
    pub level: i32,
    pub operation: String,
    pub amount: String,
    pub created_at: String,
}

/// Database row for a commission ledger entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = commissions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommissionRow {
    pub id: Option<i32>,
    pub beneficiary_id: String,
    pub transaction_id: String,
    pub from_user_id: String,
    pub level: i32,
    pub operation: String,
    pub amount: String,
    pub created_at: String,
}
