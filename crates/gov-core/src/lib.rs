#![no_std]
#[cfg(feature = "std")]
extern crate std;

mod config;
mod speed;
mod telemetry;

pub use config::{GovernorConfig, QueueWaits};
pub use speed::{arbitrate, Decision, Distance, SpeedDelta, SpeedTier};
pub use telemetry::TelemetryRecord;

// Scheduling (Board Profile, milliseconds)
pub const SAMPLE_PERIOD_MS: u64 = 300;
pub const ARBITRATE_PERIOD_MS: u64 = 300;
pub const REPORT_PERIOD_MS: u64 = 300;
pub const BRAKE_LIGHT_TICK_MS: u64 = 500;
pub const HAZARD_HOLD_MS: u64 = 1250;

// Bounded Waits
pub const SAMPLE_SEND_WAIT_MS: u64 = 10;
pub const DISTANCE_RECV_WAIT_MS: u64 = 20;
pub const DELTA_RECV_WAIT_MS: u64 = 10;
pub const TELEMETRY_SEND_WAIT_MS: u64 = 10;
pub const TELEMETRY_RECV_WAIT_MS: u64 = 20;

pub const QUEUE_CAPACITY: usize = 10;
pub const DEBOUNCE_WINDOW_MS: u64 = 200;

// Proximity thresholds (inclusive upper bound of each tier)
pub const TIER0_MAX_DISTANCE: Distance = 256;
pub const TIER1_MAX_DISTANCE: Distance = 512;
pub const TIER2_MAX_DISTANCE: Distance = 768;

/// 10-bit ADC on the reference board.
pub const ANALOG_MAX: Distance = 1023;
pub const TIER_INDICATORS: usize = 3;

/// Reference pin map. Host boards only use these as labels.
pub mod pins {
    pub const LED_TIER1: u8 = 7;
    pub const LED_TIER2: u8 = 8;
    pub const LED_TIER3: u8 = 9;
    pub const LED_HAZARD: u8 = 6;
    pub const BUTTON_BRAKE: u8 = 3;
    pub const BUTTON_ACCELERATE: u8 = 2;
    pub const ANALOG_DISTANCE: u8 = 0;
    pub const SERIAL_BAUD: u32 = 115_200;
}

/// Task names and priorities (higher runs first).
pub mod tasks {
    pub const SAMPLER: &str = "UpdateDistance";
    pub const ARBITRATOR: &str = "ShowSpeed";
    pub const BRAKE_LIGHT: &str = "SafetyBreakLightEngage";
    pub const REPORTER: &str = "UpdateSerial";

    pub const SAMPLER_PRIORITY: u8 = 4;
    pub const ARBITRATOR_PRIORITY: u8 = 3;
    pub const BRAKE_LIGHT_PRIORITY: u8 = 2;
    pub const REPORTER_PRIORITY: u8 = 1;
}

pub type GovResult<T> = Result<T, GovError>;

/// Recoverable outcomes of queue traffic. None of these halt the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovError {
    /// A receive timed out; the consumer keeps acting on its previous value.
    StaleInput,
    /// A send could not complete before its deadline; the item is discarded.
    DroppedOutput,
    /// The other end of a queue is gone.
    Disconnected,
    HalError,
}

impl core::fmt::Display for GovError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GovError {}
