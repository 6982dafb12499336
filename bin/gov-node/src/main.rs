use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Color;
use gov_core::{pins, Distance, GovernorConfig, ANALOG_MAX};
use gov_ctrl::{Diagnostics, Governor, Peripherals};
use gov_hal::{AnalogInput, DigitalOutput, PlatformClock};
use gov_linux::{ConsoleSink, Keypad, LinuxClock, Potentiometer};
use gov_rtos::{Dial, ProbePin, SimClock, SimExecutor, ThreadedExecutor};
use log::{info, warn};

mod panel;
use panel::PanelLed;

#[derive(Parser)]
#[command(name = "gov-node", about = "Adaptive speed governor control loop")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Real-time run on host threads until Ctrl-C. Type a/b + Enter to press.
    Run {
        /// Hold the sensor at this reading instead of letting it drift.
        #[arg(long)] distance: Option<Distance>,
        #[arg(long, default_value_t = 13)] seed: u64,
        /// Confine all tasks to the first core.
        #[arg(long)] pin_core: bool,
    },
    /// Deterministic virtual-time run with scripted presses.
    Replay {
        #[arg(long, default_value_t = 5_000)] duration_ms: u64,
        #[arg(long, default_value_t = 900)] distance: Distance,
        /// Change the sensor reading, as MS:DISTANCE. Repeatable.
        #[arg(long = "set", value_parser = parse_step)] steps: Vec<(u64, Distance)>,
        /// Accelerate edge at MS. Repeatable.
        #[arg(long)] accel: Vec<u64>,
        /// Brake edge at MS. Repeatable.
        #[arg(long)] brake: Vec<u64>,
    },
}

fn parse_step(s: &str) -> Result<(u64, Distance), String> {
    let (at, value) = s.split_once(':').ok_or_else(|| format!("expected MS:DISTANCE, got '{}'", s))?;
    let at = at.trim().parse::<u64>().map_err(|e| format!("bad time '{}': {}", at, e))?;
    let value = value.trim().parse::<Distance>().map_err(|e| format!("bad distance '{}': {}", value, e))?;
    Ok((at, value))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.mode {
        Mode::Run { distance, seed, pin_core } => run(distance, seed, pin_core),
        Mode::Replay { duration_ms, distance, steps, accel, brake } => {
            replay(duration_ms, distance, steps, &accel, &brake);
            Ok(())
        }
    }
}

fn panel_leds() -> ([Box<dyn DigitalOutput>; 3], Box<dyn DigitalOutput>) {
    let tiers: [Box<dyn DigitalOutput>; 3] = [
        Box::new(PanelLed::new("tier1", pins::LED_TIER1, Color::Yellow)),
        Box::new(PanelLed::new("tier2", pins::LED_TIER2, Color::Yellow)),
        Box::new(PanelLed::new("tier3", pins::LED_TIER3, Color::Yellow)),
    ];
    (tiers, Box::new(PanelLed::new("hazard", pins::LED_HAZARD, Color::Red)))
}

fn run(distance: Option<Distance>, seed: u64, pin_core: bool) -> anyhow::Result<()> {
    info!(">>> GOVERNOR NODE: real-time mode <<<");
    let clock: Arc<dyn PlatformClock> = Arc::new(LinuxClock::new());

    let sensor: Box<dyn AnalogInput> = match distance {
        Some(d) => Box::new(Potentiometer::fixed(d)),
        None => Box::new(Potentiometer::wandering(ANALOG_MAX / 2, 48, seed)),
    };
    let (tier_leds, hazard_led) = panel_leds();
    let board = Peripherals { distance_sensor: sensor, tier_leds, hazard_led, console: Box::new(ConsoleSink) };

    let governor = Governor::assemble(&GovernorConfig::default(), clock.clone(), board);
    let (tasks, lines, diag) = governor.into_parts();

    let mut exec = ThreadedExecutor::new(clock);
    if pin_core {
        match core_affinity::get_core_ids().and_then(|ids| ids.into_iter().next()) {
            Some(core) => {
                info!("Pinning tasks to core {}", core.id);
                exec = exec.pin_to_core(core);
            }
            None => warn!("No core ids available; running unpinned"),
        }
    }
    for task in tasks {
        exec.spawn(task)?;
    }
    Keypad::new(lines.brake, lines.accelerate).spawn()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Signal received. Powering off...");
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    for task in exec.tasks() {
        let s = task.stats();
        info!("{:<24} cycles={} overruns={} worst={}ms", task.name, s.cycles, s.overruns, s.worst_case_ms);
    }
    log_queues(&diag);
    Ok(())
}

fn replay(duration_ms: u64, distance: Distance, mut steps: Vec<(u64, Distance)>, accel: &[u64], brake: &[u64]) {
    info!(">>> GOVERNOR NODE: replay {}ms <<<", duration_ms);
    let clock = SimClock::new(0);
    let dial = Dial::new(distance);
    let tier_pins: [ProbePin; 3] = core::array::from_fn(|_| ProbePin::new(clock.clone()));
    let hazard = ProbePin::new(clock.clone());

    let board = Peripherals {
        distance_sensor: Box::new(dial.clone()),
        tier_leds: tier_pins.clone().map(|p| Box::new(p) as Box<dyn DigitalOutput>),
        hazard_led: Box::new(hazard.clone()),
        console: Box::new(ConsoleSink),
    };
    let governor = Governor::assemble(&GovernorConfig::virtual_time(), clock.clone(), board);
    let (tasks, lines, diag) = governor.into_parts();

    let mut exec = SimExecutor::new(clock);
    for task in tasks {
        exec.spawn(task);
    }
    for &at in accel {
        exec.raise_edge(at, lines.accelerate.clone());
    }
    for &at in brake {
        exec.raise_edge(at, lines.brake.clone());
    }

    // A reading set at MS is what the sampler sees on its release at MS.
    steps.sort_by_key(|(at, _)| *at);
    for (at, value) in steps.into_iter().filter(|(at, _)| *at <= duration_ms) {
        if at > 0 {
            exec.run_until(at - 1);
        }
        dial.set(value);
    }
    exec.run_until(duration_ms);

    for (rise, fall) in hazard.trace().pulses() {
        info!("hazard pulse {}ms..{}ms", rise, fall);
    }
    let lit = tier_pins.iter().filter(|p| p.is_high()).count();
    info!("final: {} tier LED(s) lit, hazard {}", lit, if hazard.is_high() { "ON" } else { "off" });
    log_queues(&diag);
}

fn log_queues(diag: &Diagnostics) {
    for (name, stats) in [("distance", &diag.distance), ("delta", &diag.delta), ("telemetry", &diag.telemetry)] {
        let s = stats.snapshot();
        info!("queue {:<9} accepted={} dropped={} stale={}", name, s.accepted, s.dropped, s.stale);
    }
}
