//! Fixed capability sets per tier.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Tier;

/// Highest difficulty (card count) a tier may play at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyCeiling {
    Limited(u32),
    Unbounded,
}

impl DifficultyCeiling {
    #[must_use]
    pub const fn clamp(self, requested: u32) -> u32 {
        match self {
            Self::Limited(max) if requested > max => max,
            _ => requested,
        }
    }
}

/// Permissions and multipliers attached to a tier.
///
/// Values are constants looked up by tier; nothing here is session-mutable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CapabilitySet {
    pub can_record_score: bool,
    pub can_join_leaderboard: bool,
    pub can_earn_achievements: bool,
    pub can_use_verified_randomness: bool,
    pub can_mint_rewards: bool,
    /// Fraction of the raw score credited, in `[0, 1]`.
    pub score_multiplier: f64,
    pub difficulty_ceiling: DifficultyCeiling,
}

impl CapabilitySet {
    pub const ANONYMOUS: Self = Self {
        can_record_score: false,
        can_join_leaderboard: false,
        can_earn_achievements: false,
        can_use_verified_randomness: false,
        can_mint_rewards: false,
        score_multiplier: 0.0,
        difficulty_ceiling: DifficultyCeiling::Limited(7),
    };

    pub const EMAIL: Self = Self {
        can_record_score: true,
        can_join_leaderboard: true,
        can_earn_achievements: true,
        can_use_verified_randomness: false,
        can_mint_rewards: false,
        score_multiplier: 0.8,
        difficulty_ceiling: DifficultyCeiling::Unbounded,
    };

    pub const WALLET: Self = Self {
        can_record_score: true,
        can_join_leaderboard: true,
        can_earn_achievements: true,
        can_use_verified_randomness: true,
        can_mint_rewards: true,
        score_multiplier: 1.0,
        difficulty_ceiling: DifficultyCeiling::Unbounded,
    };

    #[must_use]
    pub const fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Anonymous => Self::ANONYMOUS,
            Tier::Email => Self::EMAIL,
            Tier::Wallet => Self::WALLET,
        }
    }

    /// Score credited on the leaderboard: `floor(score * multiplier)`.
    ///
    /// Computed in whole percent so that e.g. `0.8 * 1000` is exactly 800.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn adjusted_score(&self, score: u64) -> u64 {
        let percent = (self.score_multiplier.clamp(0.0, 1.0) * 100.0).round() as u64;
        score.saturating_mul(percent) / 100
    }

    #[must_use]
    pub const fn clamp_difficulty(&self, requested: u32) -> u32 {
        self.difficulty_ceiling.clamp(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn anonymous_records_nothing() {
        let caps = Tier::Anonymous.capabilities();
        assert!(!caps.can_record_score);
        assert!(!caps.can_join_leaderboard);
        assert!(!caps.can_earn_achievements);
        assert!(!caps.can_use_verified_randomness);
        assert!(!caps.can_mint_rewards);
        assert_eq!(caps.score_multiplier, 0.0);
        assert_eq!(caps.difficulty_ceiling, DifficultyCeiling::Limited(7));
    }

    #[test]
    fn email_has_no_blockchain_features() {
        let caps = Tier::Email.capabilities();
        assert!(caps.can_record_score && caps.can_join_leaderboard && caps.can_earn_achievements);
        assert!(!caps.can_use_verified_randomness);
        assert!(!caps.can_mint_rewards);
        assert_eq!(caps.difficulty_ceiling, DifficultyCeiling::Unbounded);
    }

    #[test]
    fn wallet_has_everything() {
        let caps = Tier::Wallet.capabilities();
        assert!(caps.can_use_verified_randomness && caps.can_mint_rewards);
        assert_eq!(caps.score_multiplier, 1.0);
    }

    #[rstest]
    #[case(Tier::Anonymous, 1000, 0)]
    #[case(Tier::Email, 1000, 800)]
    #[case(Tier::Email, 1234, 987)]
    #[case(Tier::Email, 1, 0)]
    #[case(Tier::Wallet, 1234, 1234)]
    fn adjusted_score_floors(#[case] tier: Tier, #[case] raw: u64, #[case] expected: u64) {
        assert_eq!(tier.capabilities().adjusted_score(raw), expected);
    }

    #[rstest]
    #[case(Tier::Anonymous, 12, 7)]
    #[case(Tier::Anonymous, 5, 5)]
    #[case(Tier::Email, 12, 12)]
    #[case(Tier::Wallet, 40, 40)]
    fn difficulty_is_clamped_to_ceiling(
        #[case] tier: Tier,
        #[case] requested: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(tier.capabilities().clamp_difficulty(requested), expected);
    }

    #[test]
    fn ceiling_serializes_tagged() {
        let limited = serde_json::to_value(DifficultyCeiling::Limited(7)).unwrap();
        let unbounded = serde_json::to_value(DifficultyCeiling::Unbounded).unwrap();
        assert_eq!(limited, serde_json::json!({ "limited": 7 }));
        assert_eq!(unbounded, serde_json::json!("unbounded"));
    }
}
