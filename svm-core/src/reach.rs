use serde::{Deserialize, Serialize};

/// SWORD reach identifier. The last digit encodes the reach type.
pub type SwordReachId = i64;

/// MERIT-Basins reach identifier (`COMID`). Integer division by
/// [`REGION_DIVISOR`] yields the pfaf region.
pub type MbReachId = i64;

/// Divisor mapping a MERIT-Basins reach id to its pfaf region code.
pub const REGION_DIVISOR: i64 = 1_000_000;

/// Pfaf region code of a MERIT-Basins reach.
pub fn mb_region(mb_reach_id: MbReachId) -> i64 {
    mb_reach_id / REGION_DIVISOR
}

/// SWORD reach type, taken from the last digit of the reach id.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ReachType {
    River,
    LakeOnRiver,
    Dam,
    UnreliableTopology,
    Ghost,
    Other(u8),
}

impl ReachType {
    pub fn from_reach_id(reach_id: SwordReachId) -> Self {
        match reach_id.rem_euclid(10) {
            1 => ReachType::River,
            3 => ReachType::LakeOnRiver,
            4 => ReachType::Dam,
            5 => ReachType::UnreliableTopology,
            6 => ReachType::Ghost,
            d => ReachType::Other(d as u8),
        }
    }

    /// Types 1 and 5 are the reaches volumes are computed for.
    pub fn is_river(&self) -> bool {
        matches!(self, ReachType::River | ReachType::UnreliableTopology)
    }
}

/// True for SWORD type 1/5 reaches.
pub fn is_river_reach(reach_id: SwordReachId) -> bool {
    ReachType::from_reach_id(reach_id).is_river()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mb_region() {
        assert_eq!(mb_region(74_012_345), 74);
        assert_eq!(mb_region(11_000_001), 11);
        assert_eq!(mb_region(0), 0);
    }

    #[test]
    fn test_reach_type() {
        assert_eq!(ReachType::from_reach_id(74_230_000_011), ReachType::River);
        assert_eq!(ReachType::from_reach_id(74_230_000_015), ReachType::UnreliableTopology);
        assert_eq!(ReachType::from_reach_id(74_230_000_016), ReachType::Ghost);
        assert!(is_river_reach(74_230_000_011));
        assert!(is_river_reach(74_230_000_015));
        assert!(!is_river_reach(74_230_000_013));
        assert!(!is_river_reach(74_230_000_016));
    }
}
