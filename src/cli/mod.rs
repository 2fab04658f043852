//! Command-line interface definitions.

pub mod commission;
pub mod output;
pub mod rates;
pub mod referral;
pub mod stats;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::domain::Operation;

/// Teamex - referral commission and exchange-rate ledger engine.
#[derive(Parser, Debug)]
#[command(name = "teamex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or update exchange rates
    #[command(subcommand)]
    Rates(RatesCommand),

    /// Manage the referral graph
    #[command(subcommand)]
    Referral(ReferralCommand),

    /// Distribute and inspect commissions
    #[command(subcommand)]
    Commission(CommissionCommand),

    /// Show aggregate referral-program statistics
    Stats,
}

/// Subcommands for `teamex rates`
#[derive(Subcommand, Debug)]
pub enum RatesCommand {
    /// Show the current buy/sell rates
    Show,
    /// Replace the current rates (admin only)
    Set(SetRatesArgs),
    /// Show the rate change history, newest first
    History(HistoryArgs),
}

#[derive(Parser, Debug)]
pub struct SetRatesArgs {
    /// New buy rate (RUB per USDT)
    #[arg(long)]
    pub buy: Decimal,

    /// New sell rate (RUB per USDT)
    #[arg(long)]
    pub sell: Decimal,

    /// Telegram user id of the editor; must be on the admin allowlist
    #[arg(long)]
    pub editor: String,
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Subcommands for `teamex referral`
#[derive(Subcommand, Debug)]
pub enum ReferralCommand {
    /// Record that REFERRER invited REFERRED
    Add {
        /// Telegram user id of the inviter
        referrer: String,
        /// Telegram user id of the invited user
        referred: String,
    },
    /// Show a user's referrer and first-line referrals
    Show {
        /// Telegram user id
        user: String,
    },
    /// Print a user's invite link
    Link {
        /// Telegram user id
        user: String,
    },
}

/// Subcommands for `teamex commission`
#[derive(Subcommand, Debug)]
pub enum CommissionCommand {
    /// Distribute the commission for a completed transaction
    Distribute(DistributeArgs),
    /// Show a user's commission ledger and total
    Ledger {
        /// Telegram user id of the beneficiary
        user: String,
    },
}

#[derive(Parser, Debug)]
pub struct DistributeArgs {
    /// Telegram user id of the transacting user
    pub user: String,

    /// Transaction amount in RUB
    pub amount: Decimal,

    /// Operation direction: buy or sell
    pub operation: Operation,

    /// Transaction id for idempotent re-application; generated if omitted
    #[arg(long)]
    pub tx: Option<String>,
}
