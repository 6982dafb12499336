#![forbid(unsafe_code)]

//! The control loop: two debounced buttons, the distance sampler, the speed
//! arbitrator and the telemetry reporter, plus the one-time wiring that
//! connects them to each other and to the safety brake light.
//!
//! All state crossing a task boundary is created once in [`Wiring::new`]
//! and moved into its owner. There are no globals.

use std::sync::Arc;

use gov_core::{Distance, GovernorConfig, SpeedDelta, TelemetryRecord, TIER_INDICATORS};
use gov_hal::{AnalogInput, DigitalOutput, PlatformClock, TelemetrySink};
use gov_queue::{Consumer, Producer, Queue, QueueStats};
use gov_rtos::PeriodicTask;
use gov_safety::{safety_flag, BrakeLight, SafetyFlagReader, SafetyFlagWriter};
use log::info;

mod arbitrator;
mod button;
mod reporter;
mod sampler;

pub use arbitrator::SpeedArbitrator;
pub use button::{DebouncedButton, Press};
pub use reporter::TelemetryReporter;
pub use sampler::DistanceSampler;

/// Sampler → arbitrator.
pub struct SamplerPorts {
    pub distance_tx: Producer<Distance>,
}

/// Everything the arbitrator reads or writes besides its own LEDs.
pub struct ArbitratorPorts {
    pub distance_rx: Consumer<Distance>,
    pub delta_rx: Consumer<SpeedDelta>,
    pub telemetry_tx: Producer<TelemetryRecord>,
    /// The only writer of the safety flag.
    pub safety: SafetyFlagWriter,
}

pub struct BrakeLightPorts {
    pub safety: SafetyFlagReader,
}

pub struct ReporterPorts {
    pub telemetry_rx: Consumer<TelemetryRecord>,
}

/// Read-only view for logging and tests. Never consulted by a task.
pub struct Diagnostics {
    pub distance: Arc<QueueStats>,
    pub delta: Arc<QueueStats>,
    pub telemetry: Arc<QueueStats>,
    pub safety: SafetyFlagReader,
}

/// Queues, flag and button handlers, built once at startup.
pub struct Wiring {
    pub sampler: SamplerPorts,
    pub arbitrator: ArbitratorPorts,
    pub brake_light: BrakeLightPorts,
    pub reporter: ReporterPorts,
    pub brake: DebouncedButton,
    pub accelerate: DebouncedButton,
    pub diagnostics: Diagnostics,
}

impl Wiring {
    pub fn new(config: &GovernorConfig, clock: Arc<dyn PlatformClock>) -> Self {
        let distance = Queue::bounded("distance", config.queue_capacity);
        let delta = Queue::bounded("delta", config.queue_capacity);
        let telemetry = Queue::bounded("telemetry", config.queue_capacity);
        let (writer, reader) = safety_flag();

        let brake = DebouncedButton::brake(config.debounce_window_ms, clock.clone(), delta.isr_producer());
        let accelerate = DebouncedButton::accelerate(config.debounce_window_ms, clock, delta.isr_producer());

        Self {
            sampler: SamplerPorts { distance_tx: distance.producer() },
            arbitrator: ArbitratorPorts {
                distance_rx: distance.consumer(),
                delta_rx: delta.consumer(),
                telemetry_tx: telemetry.producer(),
                safety: writer,
            },
            brake_light: BrakeLightPorts { safety: reader.clone() },
            reporter: ReporterPorts { telemetry_rx: telemetry.consumer() },
            brake,
            accelerate,
            diagnostics: Diagnostics {
                distance: distance.stats(),
                delta: delta.stats(),
                telemetry: telemetry.stats(),
                safety: reader,
            },
        }
    }
}

/// Board-specific I/O handed to [`Governor::assemble`].
pub struct Peripherals {
    pub distance_sensor: Box<dyn AnalogInput>,
    /// Lowest tier first.
    pub tier_leds: [Box<dyn DigitalOutput>; TIER_INDICATORS],
    pub hazard_led: Box<dyn DigitalOutput>,
    pub console: Box<dyn TelemetrySink>,
}

/// Interrupt lines to attach to the two buttons.
pub struct InputLines {
    pub brake: Arc<DebouncedButton>,
    pub accelerate: Arc<DebouncedButton>,
}

/// The assembled loop, ready to hand to an executor.
pub struct Governor {
    pub sampler: DistanceSampler,
    pub arbitrator: SpeedArbitrator,
    pub brake_light: BrakeLight,
    pub reporter: TelemetryReporter,
    pub lines: InputLines,
    pub diagnostics: Diagnostics,
}

impl Governor {
    /// Outputs are driven inactive here, before any task runs.
    pub fn assemble(config: &GovernorConfig, clock: Arc<dyn PlatformClock>, board: Peripherals) -> Self {
        let wiring = Wiring::new(config, clock);

        let governor = Self {
            sampler: DistanceSampler::new(board.distance_sensor, wiring.sampler.distance_tx, config),
            arbitrator: SpeedArbitrator::new(wiring.arbitrator, board.tier_leds, config),
            brake_light: BrakeLight::new(wiring.brake_light.safety, board.hazard_led, config),
            reporter: TelemetryReporter::new(wiring.reporter.telemetry_rx, board.console, config),
            lines: InputLines {
                brake: Arc::new(wiring.brake),
                accelerate: Arc::new(wiring.accelerate),
            },
            diagnostics: wiring.diagnostics,
        };
        info!(
            "Governor assembled: {} slot queues, {}ms debounce",
            config.queue_capacity, config.debounce_window_ms
        );
        governor
    }

    /// Split into schedulable tasks (highest priority first), the input
    /// lines and the diagnostics view.
    pub fn into_parts(self) -> (Vec<Box<dyn PeriodicTask>>, InputLines, Diagnostics) {
        let tasks: Vec<Box<dyn PeriodicTask>> = vec![
            Box::new(self.sampler),
            Box::new(self.arbitrator),
            Box::new(self.brake_light),
            Box::new(self.reporter),
        ];
        (tasks, self.lines, self.diagnostics)
    }
}
