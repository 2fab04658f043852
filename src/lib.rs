//! Teamex - referral commission and exchange-rate ledger engine.
//!
//! This crate is the server-owned core behind a Telegram USDT/RUB exchange:
//! it tracks the current buy/sell rates with an auditable change history,
//! maintains a bounded-depth referral graph, and splits each transaction's
//! commission across up to three upstream referrers plus the platform.
//!
//! # Architecture
//!
//! - **[`domain`]** - Value types and invariants: rate snapshots, write-once
//!   referral edges with precomputed second/third lines, commission entries.
//! - **[`stores`]** - Persistence ports with SQLite (Diesel) and in-memory
//!   backends.
//! - **[`service`]** - The operations: rate updates behind an admin
//!   capability, referral registration with chain resolution, commission
//!   distribution with idempotent ledger appends, and read-side queries.
//! - **[`cli`]** / **[`app`]** - Operator CLI and wiring.
//!
//! The Telegram bot and the HTTP routing layer are external collaborators;
//! they call into this crate and serve its `{success, data}` envelopes.
//!
//! # Example
//!
//! ```no_run
//! use teamex::service::ReferralRegistry;
//! use teamex::stores::MemoryStore;
//!
//! let registry = ReferralRegistry::new(MemoryStore::new());
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod stores;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
