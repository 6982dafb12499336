#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gov_core::{tasks, GovernorConfig};
use gov_hal::DigitalOutput;
use gov_rtos::{PeriodicTask, Release, TaskSpec};
use log::debug;

/// Create the one safety flag of the loop.
///
/// The writer is unique and not `Clone`: only the arbitrator changes the
/// flag. Readers only observe; the brake light is the one task holding one.
/// A single atomic bool is all that is shared, so a read racing a write
/// just sees the old or the new value.
pub fn safety_flag() -> (SafetyFlagWriter, SafetyFlagReader) {
    let cell = Arc::new(AtomicBool::new(false));
    (SafetyFlagWriter(cell.clone()), SafetyFlagReader(cell))
}

pub struct SafetyFlagWriter(Arc<AtomicBool>);

impl SafetyFlagWriter {
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone)]
pub struct SafetyFlagReader(Arc<AtomicBool>);

impl SafetyFlagReader {
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Hazard indicator driver.
///
/// Wakes every tick; when the flag is up it lights the hazard LED and
/// holds it for the full hold time, which displaces the next tick. The
/// pulse is therefore long enough to see even though the flag itself
/// is recomputed every arbitration period. Never writes the flag.
pub struct BrakeLight {
    flag: SafetyFlagReader,
    hazard: Box<dyn DigitalOutput>,
    tick_ms: u64,
    hold_ms: u64,
    lit: bool,
    pulses: u64,
}

impl BrakeLight {
    pub fn new(flag: SafetyFlagReader, mut hazard: Box<dyn DigitalOutput>, config: &GovernorConfig) -> Self {
        hazard.set_low();
        Self {
            flag,
            hazard,
            tick_ms: config.brake_light_tick_ms,
            hold_ms: config.hazard_hold_ms,
            lit: false,
            pulses: 0,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }
}

impl PeriodicTask for BrakeLight {
    fn spec(&self) -> TaskSpec {
        // First wake is one tick after start.
        TaskSpec {
            name: tasks::BRAKE_LIGHT,
            priority: tasks::BRAKE_LIGHT_PRIORITY,
            period_ms: self.tick_ms,
            phase_ms: self.tick_ms,
        }
    }

    fn run_cycle(&mut self) -> Release {
        if self.lit {
            // End of hold: the flag is not consulted on this wake.
            self.hazard.set_low();
            self.lit = false;
            return Release::NextPeriod;
        }

        if self.flag.is_raised() {
            self.hazard.set_high();
            self.lit = true;
            self.pulses += 1;
            debug!("[SAFETY] hazard pulse #{}", self.pulses);
            return Release::After(self.hold_ms);
        }

        Release::NextPeriod
    }
}
