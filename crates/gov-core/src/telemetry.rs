use crate::{Decision, Distance};

/// Snapshot of one arbitration cycle, handed to the reporter by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub distance: Distance,
    pub safe_speed: u8,
    pub desired: u8,
    pub cur_speed: u8,
}

impl TelemetryRecord {
    pub fn new(distance: Distance, decision: &Decision) -> Self {
        Self {
            distance,
            safe_speed: decision.safe.get(),
            desired: decision.desired.get(),
            cur_speed: decision.current.get(),
        }
    }
}

/// Operator line format. Two spaces between fields.
impl core::fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Distance {}  Safe Speed {}  Desired {}  Current Speed {}",
            self.distance, self.safe_speed, self.desired, self.cur_speed
        )
    }
}
