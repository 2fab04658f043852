//! Referral graph service: edge creation with bounded chain resolution.

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::error::DomainError;
use crate::domain::{ReferralEdge, ReferredUser, UserId};
use crate::error::Result;
use crate::stores::ReferralStore;

/// Manages the write-once "referred by" relation.
pub struct ReferralRegistry<S: ReferralStore> {
    store: S,
}

impl<S: ReferralStore> ReferralRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record that `referrer` invited `referred`.
    ///
    /// The upstream chain is resolved here, once, by a bounded 2-hop walk:
    /// the second line is the referrer's own referrer and the third line is
    /// that user's referrer, as they stand right now. Deeper ancestry is
    /// ignored, and later upstream changes never rewrite this edge.
    ///
    /// # Errors
    /// [`DomainError::MissingUserId`] for empty ids,
    /// [`DomainError::SelfReferral`] when both sides are the same user,
    /// [`DomainError::AlreadyReferred`] when the referred user already has
    /// an edge (including losing a concurrent race). None of these mutate
    /// the graph.
    pub async fn add_referral(&self, referrer: &UserId, referred: &UserId) -> Result<ReferralEdge> {
        if referrer.is_empty() {
            return Err(DomainError::MissingUserId {
                field: "referrer_id",
            }
            .into());
        }
        if referred.is_empty() {
            return Err(DomainError::MissingUserId {
                field: "referred_id",
            }
            .into());
        }
        if referrer == referred {
            return Err(DomainError::SelfReferral {
                user_id: referred.to_string(),
            }
            .into());
        }

        if let Some(existing) = self.store.edge(referred).await? {
            return Err(DomainError::AlreadyReferred {
                referred_id: referred.to_string(),
                existing_referrer: existing.referrer_id.to_string(),
            }
            .into());
        }

        let second_line_id = match self.store.edge(referrer).await? {
            Some(edge) => Some(edge.referrer_id),
            None => None,
        };
        let third_line_id = match &second_line_id {
            Some(second) => self.store.edge(second).await?.map(|e| e.referrer_id),
            None => None,
        };

        let edge = ReferralEdge {
            referred_id: referred.clone(),
            referrer_id: referrer.clone(),
            second_line_id,
            third_line_id,
            date_added: Utc::now(),
        };

        // The store insert is the compare-and-set; losing a race here is
        // the same conflict as the pre-check above.
        if !self.store.insert_edge(&edge).await? {
            let existing = self.store.edge(referred).await?;
            return Err(DomainError::AlreadyReferred {
                referred_id: referred.to_string(),
                existing_referrer: existing
                    .map(|e| e.referrer_id.to_string())
                    .unwrap_or_default(),
            }
            .into());
        }

        info!(
            referrer = %edge.referrer_id,
            referred = %edge.referred_id,
            second_line = edge.second_line_id.as_ref().map(UserId::as_str),
            third_line = edge.third_line_id.as_ref().map(UserId::as_str),
            "referral recorded"
        );
        Ok(edge)
    }

    /// The edge pointing at `user`'s referrer, if any.
    pub async fn get_referrer(&self, user: &UserId) -> Result<Option<ReferralEdge>> {
        self.store.edge(user).await
    }

    /// All users `user` directly referred (first line only).
    pub async fn get_downstream(&self, user: &UserId) -> Result<Vec<ReferredUser>> {
        let downstream = self.store.downstream(user).await?;
        debug!(user = %user, count = downstream.len(), "downstream lookup");
        Ok(downstream)
    }
}

/// A user's referral code for deep links.
#[must_use]
pub fn referral_code(user_id: &UserId) -> String {
    format!(
        "ref_{}_{}",
        user_id,
        to_base36(Utc::now().timestamp_millis())
    )
}

/// The `t.me` invite link carrying the referral code.
#[must_use]
pub fn referral_link(user_id: &UserId, bot_username: &str) -> String {
    format!("https://t.me/{bot_username}?start={}", referral_code(user_id))
}

fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
