use gov_core::{arbitrate, tasks, Decision, Distance, GovernorConfig, QueueWaits, SpeedTier, TelemetryRecord, TIER_INDICATORS};
use gov_hal::DigitalOutput;
use gov_rtos::{PeriodicTask, Release, TaskSpec};
use log::{debug, trace};

use crate::ArbitratorPorts;

/// The speed governor proper.
///
/// Owns the driver's requested speed; nothing else can change it. Each
/// cycle it takes at most one distance reading and at most one press,
/// recomputes the ceiling, lights the tier LEDs and emits one record.
pub struct SpeedArbitrator {
    ports: ArbitratorPorts,
    tier_leds: [Box<dyn DigitalOutput>; TIER_INDICATORS],
    period_ms: u64,
    waits: QueueWaits,

    // Held across cycles. A missed reading keeps the previous value.
    distance: Distance,
    desired: SpeedTier,

    last_decision: Option<Decision>,
    stale_cycles: u64,
    dropped_records: u64,
}

impl SpeedArbitrator {
    pub fn new(
        ports: ArbitratorPorts,
        mut tier_leds: [Box<dyn DigitalOutput>; TIER_INDICATORS],
        config: &GovernorConfig,
    ) -> Self {
        for led in tier_leds.iter_mut() {
            led.set_low();
        }
        Self {
            ports,
            tier_leds,
            period_ms: config.arbitrate_period_ms,
            waits: config.waits,
            distance: 0,
            desired: SpeedTier::STOP,
            last_decision: None,
            stale_cycles: 0,
            dropped_records: 0,
        }
    }

    pub fn desired(&self) -> SpeedTier {
        self.desired
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }

    /// Cycles that ran on a held distance.
    pub fn stale_cycles(&self) -> u64 {
        self.stale_cycles
    }

    pub fn dropped_records(&self) -> u64 {
        self.dropped_records
    }

    /// One arbitration cycle.
    pub fn step(&mut self) -> TelemetryRecord {
        self.ports.safety.clear();

        match self.ports.distance_rx.recv(self.waits.distance_recv_ms) {
            Ok(d) => self.distance = d,
            Err(e) => {
                self.stale_cycles += 1;
                trace!("[ARB] holding distance {} ({})", self.distance, e);
            }
        }

        let delta = self.ports.delta_rx.recv(self.waits.delta_recv_ms).ok();

        let decision = arbitrate(self.distance, self.desired, delta);
        self.desired = decision.desired;
        if decision.hazard {
            self.ports.safety.raise();
        }

        for (led, lit) in self.tier_leds.iter_mut().zip(decision.current.indicators()) {
            led.set_level(lit);
        }

        let record = TelemetryRecord::new(self.distance, &decision);
        if let Err(e) = self.ports.telemetry_tx.send(record, self.waits.telemetry_send_ms) {
            self.dropped_records += 1;
            debug!("[ARB] telemetry not delivered: {}", e);
        }

        self.last_decision = Some(decision);
        record
    }
}

impl PeriodicTask for SpeedArbitrator {
    fn spec(&self) -> TaskSpec {
        TaskSpec {
            name: tasks::ARBITRATOR,
            priority: tasks::ARBITRATOR_PRIORITY,
            period_ms: self.period_ms,
            phase_ms: 0,
        }
    }

    fn run_cycle(&mut self) -> Release {
        self.step();
        Release::NextPeriod
    }
}
