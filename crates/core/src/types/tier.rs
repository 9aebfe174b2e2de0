//! Account tier model.
//!
//! A shopper's tier is derived fresh on every evaluation from three inputs:
//! whether a session is authenticated, the declared account type, and the
//! business verification status. Tiers are never cached across requests - the
//! verification system may flip a business account to verified at any time and
//! the next evaluation must observe it.

use serde::{Deserialize, Serialize};

/// Declared account type chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Individual,
    Business,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Business => write!(f, "business"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(Self::Individual),
            "business" => Ok(Self::Business),
            _ => Err(format!("invalid account type: {s}")),
        }
    }
}

/// Business verification status.
///
/// Only meaningful for business accounts; individual accounts never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "verification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Verified,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unverified => write!(f, "unverified"),
            Self::Verified => write!(f, "verified"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(Self::Unverified),
            "verified" => Ok(Self::Verified),
            _ => Err(format!("invalid verification status: {s}")),
        }
    }
}

/// The inputs to tier derivation, gathered once per request.
///
/// Collecting these into one struct keeps the optional-field checks in a
/// single place instead of scattering them across handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierInputs {
    /// Whether an authenticated session is present.
    pub is_authenticated: bool,
    /// The declared account type, if the user record carries one.
    pub account_type: Option<AccountType>,
    /// The business verification status, if the profile carries one.
    pub verification_status: Option<VerificationStatus>,
}

/// A shopper's access tier.
///
/// Drives pricing visibility and checkout permissions via
/// [`crate::pricing::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserTier {
    /// Anonymous shopper with no session.
    Guest,
    /// Authenticated non-business account.
    Individual,
    /// Business account awaiting verification.
    BusinessUnverified,
    /// Business account that passed verification.
    BusinessVerified,
}

impl UserTier {
    /// All tiers, for exhaustive table-driven tests.
    pub const ALL: [Self; 4] = [
        Self::Guest,
        Self::Individual,
        Self::BusinessUnverified,
        Self::BusinessVerified,
    ];

    /// Derive the tier for one request.
    ///
    /// Exactly one tier applies to a given set of inputs:
    ///
    /// - no authenticated session yields `Guest`, regardless of any stale
    ///   declared fields
    /// - an authenticated account without a `business` declaration is
    ///   `Individual`
    /// - a business account is `BusinessVerified` only when the verification
    ///   status is explicitly `Verified`; an absent status means unverified
    #[must_use]
    pub fn derive(inputs: &TierInputs) -> Self {
        if !inputs.is_authenticated {
            return Self::Guest;
        }

        match inputs.account_type {
            Some(AccountType::Business) => match inputs.verification_status {
                Some(VerificationStatus::Verified) => Self::BusinessVerified,
                Some(VerificationStatus::Unverified) | None => Self::BusinessUnverified,
            },
            Some(AccountType::Individual) | None => Self::Individual,
        }
    }

    /// Whether this tier belongs to an authenticated account.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Guest)
    }
}

impl std::fmt::Display for UserTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Individual => write!(f, "individual"),
            Self::BusinessUnverified => write!(f, "business_unverified"),
            Self::BusinessVerified => write!(f, "business_verified"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_is_guest() {
        // Stale declared fields must not leak through for anonymous sessions.
        let inputs = TierInputs {
            is_authenticated: false,
            account_type: Some(AccountType::Business),
            verification_status: Some(VerificationStatus::Verified),
        };
        assert_eq!(UserTier::derive(&inputs), UserTier::Guest);
    }

    #[test]
    fn test_authenticated_without_account_type_is_individual() {
        let inputs = TierInputs {
            is_authenticated: true,
            account_type: None,
            verification_status: None,
        };
        assert_eq!(UserTier::derive(&inputs), UserTier::Individual);
    }

    #[test]
    fn test_business_without_status_is_unverified() {
        let inputs = TierInputs {
            is_authenticated: true,
            account_type: Some(AccountType::Business),
            verification_status: None,
        };
        assert_eq!(UserTier::derive(&inputs), UserTier::BusinessUnverified);
    }

    #[test]
    fn test_verification_flip_changes_tier() {
        // Flipping only the verification status moves the tier.
        let mut inputs = TierInputs {
            is_authenticated: true,
            account_type: Some(AccountType::Business),
            verification_status: Some(VerificationStatus::Unverified),
        };
        assert_eq!(UserTier::derive(&inputs), UserTier::BusinessUnverified);

        inputs.verification_status = Some(VerificationStatus::Verified);
        assert_eq!(UserTier::derive(&inputs), UserTier::BusinessVerified);
    }

    #[test]
    fn test_verified_individual_is_still_individual() {
        // Verification status on a non-business account is ignored.
        let inputs = TierInputs {
            is_authenticated: true,
            account_type: Some(AccountType::Individual),
            verification_status: Some(VerificationStatus::Verified),
        };
        assert_eq!(UserTier::derive(&inputs), UserTier::Individual);
    }

    #[test]
    fn test_display_roundtrip() {
        assert_eq!(UserTier::BusinessVerified.to_string(), "business_verified");
        assert_eq!("business".parse::<AccountType>(), Ok(AccountType::Business));
        assert!("wholesale".parse::<AccountType>().is_err());
    }
}
