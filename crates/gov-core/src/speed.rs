use crate::{TIER0_MAX_DISTANCE, TIER1_MAX_DISTANCE, TIER2_MAX_DISTANCE, TIER_INDICATORS};

/// Raw proximity reading. No range is enforced; the ADC happens to give 0..=1023.
pub type Distance = i32;

/// One accepted button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedDelta {
    Brake,
    Hold,
    Accelerate,
}

impl SpeedDelta {
    pub const fn steps(self) -> i32 {
        match self {
            SpeedDelta::Brake => -1,
            SpeedDelta::Hold => 0,
            SpeedDelta::Accelerate => 1,
        }
    }
}

/// A speed level in `[0, 3]`. Construction always clamps, so an
/// out-of-range tier cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct SpeedTier(u8);

impl SpeedTier {
    pub const STOP: Self = Self(0);
    pub const MAX: Self = Self(3);

    pub const fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX.0 { Some(Self(level)) } else { None }
    }

    pub const fn clamped(level: i32) -> Self {
        if level < 0 {
            Self::STOP
        } else if level > Self::MAX.0 as i32 {
            Self::MAX
        } else {
            Self(level as u8)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Shift by an arbitrary number of steps, then clamp.
    pub const fn offset(self, steps: i32) -> Self {
        Self::clamped((self.0 as i32).saturating_add(steps))
    }

    pub const fn apply(self, delta: SpeedDelta) -> Self {
        self.offset(delta.steps())
    }

    /// Safe-speed bucket for a proximity reading.
    pub const fn from_distance(distance: Distance) -> Self {
        if distance <= TIER0_MAX_DISTANCE {
            Self(0)
        } else if distance <= TIER1_MAX_DISTANCE {
            Self(1)
        } else if distance <= TIER2_MAX_DISTANCE {
            Self(2)
        } else {
            Self(3)
        }
    }

    /// Thermometer encoding: indicator `i` is lit iff `i < tier`.
    pub fn indicators(self) -> [bool; TIER_INDICATORS] {
        core::array::from_fn(|i| i < self.0 as usize)
    }
}

impl core::fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one arbitration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub desired: SpeedTier,
    pub safe: SpeedTier,
    pub current: SpeedTier,
    pub hazard: bool,
}

/// Reconcile the driver's request against the proximity ceiling.
///
/// `desired` is the setting carried over from the previous cycle; `delta`
/// is the press received this cycle, if any.
pub fn arbitrate(distance: Distance, desired: SpeedTier, delta: Option<SpeedDelta>) -> Decision {
    let desired = match delta {
        Some(d) => desired.apply(d),
        None => desired,
    };
    let safe = SpeedTier::from_distance(distance);

    Decision {
        desired,
        safe,
        current: core::cmp::min(safe, desired),
        hazard: safe < desired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        let cases = [(256, 0), (257, 1), (512, 1), (513, 2), (768, 2), (769, 3)];
        for (d, tier) in cases {
            assert_eq!(SpeedTier::from_distance(d).get(), tier, "distance {}", d);
        }
        assert_eq!(SpeedTier::from_distance(i32::MIN), SpeedTier::STOP);
        assert_eq!(SpeedTier::from_distance(i32::MAX), SpeedTier::MAX);
    }

    #[test]
    fn bucket_is_monotonic() {
        let mut prev = SpeedTier::from_distance(-100);
        for d in -100..=1100 {
            let tier = SpeedTier::from_distance(d);
            assert!(tier >= prev, "bucket dropped at {}", d);
            prev = tier;
        }
    }

    #[test]
    fn offset_clamps_any_magnitude() {
        assert_eq!(SpeedTier::MAX.offset(i32::MAX), SpeedTier::MAX);
        assert_eq!(SpeedTier::STOP.offset(i32::MIN), SpeedTier::STOP);
        assert_eq!(SpeedTier::STOP.offset(2).get(), 2);
        assert_eq!(SpeedTier::new(4), None);
    }

    #[test]
    fn thermometer_encoding() {
        assert_eq!(SpeedTier::clamped(0).indicators(), [false, false, false]);
        assert_eq!(SpeedTier::clamped(1).indicators(), [true, false, false]);
        assert_eq!(SpeedTier::clamped(2).indicators(), [true, true, false]);
        assert_eq!(SpeedTier::clamped(3).indicators(), [true, true, true]);
    }

    #[test]
    fn hazard_only_when_request_exceeds_ceiling() {
        let d = arbitrate(100, SpeedTier::MAX, None);
        assert!(d.hazard);
        assert_eq!(d.current, SpeedTier::STOP);

        let d = arbitrate(900, SpeedTier::MAX, None);
        assert!(!d.hazard);
        assert_eq!(d.current, SpeedTier::MAX);

        // Equal request and ceiling is not a hazard.
        let d = arbitrate(500, SpeedTier::clamped(1), None);
        assert!(!d.hazard);
    }
}
