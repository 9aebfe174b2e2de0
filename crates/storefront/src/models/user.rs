//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use meridian_core::{AccountType, Email, TierInputs, UserId, UserTier, VerificationStatus};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// Declared account type.
    pub account_type: AccountType,
    /// Business verification status, if the profile carries one.
    pub verification_status: Option<VerificationStatus>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Derive the user's current tier from the stored account fields.
    ///
    /// Recomputed on every call; the tier is never stored on the record.
    #[must_use]
    pub fn tier(&self) -> UserTier {
        UserTier::derive(&TierInputs {
            is_authenticated: true,
            account_type: Some(self.account_type),
            verification_status: self.verification_status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(account_type: AccountType, status: Option<VerificationStatus>) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("buyer@example.com").unwrap(),
            email_verified: true,
            account_type,
            verification_status: status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tier_individual() {
        assert_eq!(
            user(AccountType::Individual, None).tier(),
            UserTier::Individual
        );
    }

    #[test]
    fn test_tier_business() {
        assert_eq!(
            user(AccountType::Business, None).tier(),
            UserTier::BusinessUnverified
        );
        assert_eq!(
            user(AccountType::Business, Some(VerificationStatus::Verified)).tier(),
            UserTier::BusinessVerified
        );
    }
}
