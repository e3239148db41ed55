//! TTL tiers for cached entities.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long an entry may live, chosen by how volatile the entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlTier {
    /// Five minutes.
    Short,
    /// One hour.
    Medium,
    /// One day.
    Long,
    /// One week.
    VeryLong,
}

impl TtlTier {
    pub const SHORT_SECS: u64 = 300;
    pub const MEDIUM_SECS: u64 = 3_600;
    pub const LONG_SECS: u64 = 86_400;
    pub const VERY_LONG_SECS: u64 = 604_800;

    /// TTL in whole seconds. Always positive.
    pub const fn seconds(self) -> u64 {
        match self {
            TtlTier::Short => Self::SHORT_SECS,
            TtlTier::Medium => Self::MEDIUM_SECS,
            TtlTier::Long => Self::LONG_SECS,
            TtlTier::VeryLong => Self::VERY_LONG_SECS,
        }
    }

    pub const fn duration(self) -> Duration {
        Duration::from_secs(self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_seconds() {
        assert_eq!(TtlTier::Short.seconds(), 300);
        assert_eq!(TtlTier::Medium.seconds(), 3600);
        assert_eq!(TtlTier::Long.seconds(), 86400);
        assert_eq!(TtlTier::VeryLong.seconds(), 604800);
    }

    #[test]
    fn test_tiers_are_positive_and_ordered() {
        let tiers = [
            TtlTier::Short,
            TtlTier::Medium,
            TtlTier::Long,
            TtlTier::VeryLong,
        ];
        assert!(tiers.iter().all(|t| t.seconds() > 0));
        assert!(tiers.windows(2).all(|w| w[0].seconds() < w[1].seconds()));
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&TtlTier::VeryLong).unwrap();
        assert_eq!(json, "\"very_long\"");
        let tier: TtlTier = serde_json::from_str("\"short\"").unwrap();
        assert_eq!(tier, TtlTier::Short);
    }

    #[test]
    fn test_duration() {
        assert_eq!(TtlTier::Medium.duration(), Duration::from_secs(3600));
    }
}
