//! Tier-to-permission mapping for pricing and checkout.
//!
//! [`resolve`] is the single source of truth for what each tier may see and
//! do. It is a total, pure function over [`UserTier`]; calling it twice with
//! the same tier always yields equal bundles. The helper predicates at the
//! bottom are thin projections of `resolve` rather than independently
//! maintained logic, so the two can never drift.
//!
//! The business rule in one line: account type gates price *visibility*,
//! verification status gates *purchasing*. Quote requests are open to every
//! tier.

use serde::Serialize;

use crate::types::UserTier;

/// The permission bundle for one tier.
///
/// Constructed fresh from a [`UserTier`] on each request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingPermissions {
    /// Whether unit prices are shown at all.
    pub can_view_price: bool,
    /// Whether add-to-cart and checkout are available.
    pub can_buy: bool,
    /// Whether the request-a-quote flow is available.
    pub can_request_quote: bool,
    /// Whether volume price breaks are shown.
    pub show_bulk_pricing: bool,
    /// Label for the primary call-to-action button.
    pub primary_cta: &'static str,
    /// Label for the secondary call-to-action button.
    pub secondary_cta: &'static str,
    /// Banner copy explaining the account's current standing.
    pub status_message: &'static str,
    /// Short inline copy shown next to the (hidden) price.
    pub micro_copy: &'static str,
}

/// Resolve the fixed permission bundle for a tier.
///
/// The four bundles below are the complete permission table; there is no
/// other combination reachable at runtime.
#[must_use]
pub const fn resolve(tier: UserTier) -> PricingPermissions {
    match tier {
        UserTier::Guest => PricingPermissions {
            can_view_price: false,
            can_buy: false,
            can_request_quote: true,
            show_bulk_pricing: false,
            primary_cta: "Request a quote",
            secondary_cta: "Sign in to see pricing",
            status_message: "Create a business account to unlock wholesale pricing.",
            micro_copy: "Sign in for pricing",
        },
        UserTier::Individual => PricingPermissions {
            can_view_price: false,
            can_buy: false,
            can_request_quote: true,
            show_bulk_pricing: false,
            primary_cta: "Request a quote",
            secondary_cta: "Upgrade to a business account",
            status_message: "Wholesale pricing is available to business accounts.",
            micro_copy: "Business accounts only",
        },
        UserTier::BusinessUnverified => PricingPermissions {
            can_view_price: true,
            can_buy: false,
            can_request_quote: true,
            show_bulk_pricing: false,
            primary_cta: "Request a quote",
            secondary_cta: "Complete verification",
            status_message: "Your business is pending verification. Ordering unlocks once verified.",
            micro_copy: "Verification pending",
        },
        UserTier::BusinessVerified => PricingPermissions {
            can_view_price: true,
            can_buy: true,
            can_request_quote: true,
            show_bulk_pricing: true,
            primary_cta: "Add to cart",
            secondary_cta: "Request a quote",
            status_message: "Your business is verified.",
            micro_copy: "",
        },
    }
}

/// Whether the tier may see unit prices.
#[must_use]
pub const fn can_view_price(tier: UserTier) -> bool {
    resolve(tier).can_view_price
}

/// Whether the tier may add to cart and purchase.
#[must_use]
pub const fn can_buy(tier: UserTier) -> bool {
    resolve(tier).can_buy
}

/// Whether the tier may proceed through checkout.
///
/// Checkout is gated by the same rule as buying.
#[must_use]
pub const fn can_checkout(tier: UserTier) -> bool {
    can_buy(tier)
}

/// Whether the tier may request a quote.
#[must_use]
pub const fn can_request_quote(tier: UserTier) -> bool {
    resolve(tier).can_request_quote
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The permission table, row for row. This mirrors the product rules
    /// document and is the contract the resolver must reproduce.
    const TABLE: [(UserTier, bool, bool, bool, bool); 4] = [
        (UserTier::Guest, false, false, true, false),
        (UserTier::Individual, false, false, true, false),
        (UserTier::BusinessUnverified, true, false, true, false),
        (UserTier::BusinessVerified, true, true, true, true),
    ];

    #[test]
    fn test_permission_table() {
        for (tier, view, buy, quote, bulk) in TABLE {
            let perms = resolve(tier);
            assert_eq!(perms.can_view_price, view, "can_view_price for {tier}");
            assert_eq!(perms.can_buy, buy, "can_buy for {tier}");
            assert_eq!(perms.can_request_quote, quote, "can_request_quote for {tier}");
            assert_eq!(perms.show_bulk_pricing, bulk, "show_bulk_pricing for {tier}");
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for tier in UserTier::ALL {
            assert_eq!(resolve(tier), resolve(tier));
        }
    }

    #[test]
    fn test_predicates_match_resolve() {
        // The predicates must project resolve(), not re-encode the table.
        for tier in UserTier::ALL {
            let perms = resolve(tier);
            assert_eq!(can_view_price(tier), perms.can_view_price);
            assert_eq!(can_buy(tier), perms.can_buy);
            assert_eq!(can_checkout(tier), perms.can_buy);
            assert_eq!(can_request_quote(tier), perms.can_request_quote);
        }
    }

    #[test]
    fn test_ctas_are_populated() {
        for tier in UserTier::ALL {
            let perms = resolve(tier);
            assert!(!perms.primary_cta.is_empty(), "primary CTA for {tier}");
            assert!(!perms.secondary_cta.is_empty(), "secondary CTA for {tier}");
            assert!(!perms.status_message.is_empty(), "status message for {tier}");
        }
    }

    #[test]
    fn test_buy_cta_only_when_buying_allowed() {
        for tier in UserTier::ALL {
            let perms = resolve(tier);
            if perms.can_buy {
                assert_eq!(perms.primary_cta, "Add to cart");
            } else {
                assert_eq!(perms.primary_cta, "Request a quote");
            }
        }
    }

    #[test]
    fn test_verification_gates_purchasing() {
        // Same account type, different verification status: only the
        // verified business may buy, but both see prices.
        assert!(can_view_price(UserTier::BusinessUnverified));
        assert!(!can_buy(UserTier::BusinessUnverified));
        assert!(can_view_price(UserTier::BusinessVerified));
        assert!(can_buy(UserTier::BusinessVerified));
    }
}
