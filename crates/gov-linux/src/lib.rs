#![forbid(unsafe_code)]

//! Host stand-ins for the board: wall clock, a simulated potentiometer,
//! stdout as the serial port and the keyboard as the two button lines.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use gov_core::{Distance, ANALOG_MAX};
use gov_hal::{AnalogInput, PlatformClock, TelemetrySink};
use gov_rtos::EdgeHandler;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Milliseconds since construction.
pub struct LinuxClock(Instant);

impl LinuxClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl Default for LinuxClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformClock for LinuxClock {
    fn now_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

enum Model {
    Fixed,
    Wander { step: Distance, rng: StdRng },
}

/// Simulated 10-bit potentiometer.
pub struct Potentiometer {
    value: Distance,
    model: Model,
}

impl Potentiometer {
    pub fn fixed(value: Distance) -> Self {
        Self { value, model: Model::Fixed }
    }

    /// Bounded random walk over `0..=ANALOG_MAX`, at most `step` per read.
    pub fn wandering(start: Distance, step: Distance, seed: u64) -> Self {
        Self {
            value: start.clamp(0, ANALOG_MAX),
            model: Model::Wander { step: step.abs(), rng: StdRng::seed_from_u64(seed) },
        }
    }
}

impl AnalogInput for Potentiometer {
    fn read(&mut self) -> Distance {
        if let Model::Wander { step, rng } = &mut self.model {
            let drift = rng.gen_range(-*step..=*step);
            self.value = (self.value + drift).clamp(0, ANALOG_MAX);
        }
        self.value
    }
}

/// Telemetry to stdout, one line per record.
#[derive(Default)]
pub struct ConsoleSink;

impl TelemetrySink for ConsoleSink {
    fn write_line(&mut self, line: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line) {
            warn!("console write failed: {}", e);
        }
    }
}

/// Keyboard as the two button interrupt lines.
///
/// `a`/`+` raise the accelerate edge, `b`/`-` the brake edge. Every matching
/// character of an input line is one edge, so `aaa` is three presses in
/// quick succession (and mostly bounces).
pub struct Keypad {
    brake: Arc<dyn EdgeHandler>,
    accelerate: Arc<dyn EdgeHandler>,
}

impl Keypad {
    pub fn new(brake: Arc<dyn EdgeHandler>, accelerate: Arc<dyn EdgeHandler>) -> Self {
        Self { brake, accelerate }
    }

    /// Returns whether `key` maps to a line.
    pub fn dispatch(&self, key: char) -> bool {
        match key {
            'a' | 'A' | '+' => self.accelerate.on_edge(),
            'b' | 'B' | '-' => self.brake.on_edge(),
            _ => return false,
        }
        true
    }

    pub fn spawn(self) -> anyhow::Result<JoinHandle<()>> {
        let handle = thread::Builder::new().name("keypad".into()).spawn(move || {
            info!("Keypad armed: 'a' accelerate, 'b' brake");
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        let edges = line.chars().filter(|c| self.dispatch(*c)).count();
                        debug!("keypad: {} edge(s)", edges);
                    }
                    Err(e) => {
                        warn!("keypad closed: {}", e);
                        break;
                    }
                }
            }
        })?;
        Ok(handle)
    }
}
