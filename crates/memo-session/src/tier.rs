//! Tier and capability resolution.

use memo_core::{CapabilitySet, Tier, WalletAddress};

use crate::signal::ActiveSignals;

/// Select the tier for a set of provider signals.
///
/// A valid wallet signal wins, then a valid email signal, otherwise
/// anonymous. Loading and failed signals count as absent, and so does a
/// wallet sign-in whose address is not a Flow or EVM address. Pure: the
/// same signals always yield the same tier and capability set.
#[must_use]
pub fn resolve_tier(signals: &ActiveSignals) -> (Tier, CapabilitySet) {
    let wallet_valid = signals
        .wallet
        .confirmed_id()
        .is_some_and(|address| WalletAddress::parse(address).is_ok());

    let tier = if wallet_valid {
        Tier::Wallet
    } else if signals.email.is_valid() {
        Tier::Email
    } else {
        Tier::Anonymous
    };
    (tier, tier.capabilities())
}
