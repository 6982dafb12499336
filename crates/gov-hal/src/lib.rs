#![no_std]
#![forbid(unsafe_code)]

use gov_core::Distance;

/// Monotonic millisecond clock.
/// INVARIANT: Never goes backwards. Safe to read from interrupt context.
pub trait PlatformClock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// A single push-pull output (LED).
pub trait DigitalOutput: Send {
    fn set_level(&mut self, high: bool);

    fn set_high(&mut self) {
        self.set_level(true);
    }

    fn set_low(&mut self) {
        self.set_level(false);
    }
}

/// One analog channel. Sampling is assumed to be quick and never fails.
pub trait AnalogInput: Send {
    fn read(&mut self) -> Distance;
}

/// Operator-facing text stream (serial port on the board, stdout on a host).
pub trait TelemetrySink: Send {
    fn write_line(&mut self, line: &str);
}
