//! Admin capability checks for rate-mutating operations.
//!
//! Rate updates carry an [`AdminToken`], which can only be minted by
//! [`AdminDirectory::authorize`] against the configured allowlist of
//! Telegram user ids. There is no bypass path.

use std::collections::HashSet;

use tracing::warn;

use crate::domain::error::DomainError;
use crate::domain::UserId;

/// Proof that the holder passed the admin check.
///
/// Construction is private to this module; services accept it as evidence
/// instead of re-checking ids themselves.
#[derive(Debug, Clone)]
pub struct AdminToken {
    user_id: UserId,
}

impl AdminToken {
    /// The verified admin identity, used as the editor on audit records.
    #[must_use]
    pub fn editor(&self) -> &str {
        self.user_id.as_str()
    }
}

/// The configured set of admin user ids.
#[derive(Debug, Clone, Default)]
pub struct AdminDirectory {
    admins: HashSet<UserId>,
}

impl AdminDirectory {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Mint a token for `user_id` if it is on the allowlist.
    ///
    /// # Errors
    /// Returns [`DomainError::Unauthorized`] otherwise.
    pub fn authorize(&self, user_id: &UserId) -> Result<AdminToken, DomainError> {
        if !self.admins.contains(user_id) {
            warn!(user_id = %user_id, "rejected admin authorization");
            return Err(DomainError::Unauthorized {
                user_id: user_id.to_string(),
            });
        }
        Ok(AdminToken {
            user_id: user_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_user_gets_a_token() {
        let directory = AdminDirectory::new([UserId::new("42")]);
        let token = directory.authorize(&UserId::new("42")).unwrap();
        assert_eq!(token.editor(), "42");
    }

    #[test]
    fn unlisted_user_is_rejected() {
        let directory = AdminDirectory::new([UserId::new("42")]);
        let err = directory.authorize(&UserId::new("7")).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[test]
    fn empty_directory_rejects_everyone() {
        let directory = AdminDirectory::default();
        assert!(directory.authorize(&UserId::new("42")).is_err());
    }
}
