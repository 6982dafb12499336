use std::sync::Arc;

use gov_core::{GovernorConfig, SpeedTier, TelemetryRecord};
use gov_hal::{DigitalOutput, PlatformClock};
use gov_ctrl::{Press, SpeedArbitrator, Wiring};
use gov_rtos::{PinTrace, ProbePin, SimClock};

struct Bench {
    clock: Arc<SimClock>,
    arb: SpeedArbitrator,
    wiring_rest: Rest,
    tiers: [Arc<PinTrace>; 3],
}

// The parts of the wiring the arbitrator does not own.
struct Rest {
    distance_tx: gov_queue::Producer<i32>,
    telemetry_rx: gov_queue::Consumer<TelemetryRecord>,
    brake: gov_ctrl::DebouncedButton,
    accelerate: gov_ctrl::DebouncedButton,
    safety: gov_safety::SafetyFlagReader,
}

fn bench() -> Bench {
    let clock = SimClock::new(1_000);
    let config = GovernorConfig::virtual_time();
    let wiring = Wiring::new(&config, clock.clone());

    let pins: [ProbePin; 3] = core::array::from_fn(|_| ProbePin::new(clock.clone()));
    let tiers = [pins[0].trace(), pins[1].trace(), pins[2].trace()];
    let leds = pins.map(|p| Box::new(p) as Box<dyn DigitalOutput>);

    let arb = SpeedArbitrator::new(wiring.arbitrator, leds, &config);
    Bench {
        clock,
        arb,
        wiring_rest: Rest {
            distance_tx: wiring.sampler.distance_tx,
            telemetry_rx: wiring.reporter.telemetry_rx,
            brake: wiring.brake,
            accelerate: wiring.accelerate,
            safety: wiring.diagnostics.safety,
        },
        tiers,
    }
}

fn lit(tiers: &[Arc<PinTrace>; 3]) -> [bool; 3] {
    [tiers[0].level(), tiers[1].level(), tiers[2].level()]
}

#[test]
fn test_hold_last_distance() {
    let mut b = bench();

    b.wiring_rest.distance_tx.send(900, 0).unwrap();
    assert_eq!(b.arb.step().distance, 900);

    // Nothing new: the old reading is reused, not zeroed.
    let rec = b.arb.step();
    assert_eq!(rec.distance, 900);
    assert_eq!(rec.safe_speed, 3);
    assert_eq!(b.arb.stale_cycles(), 1);
}

#[test]
fn test_no_reading_ever_means_zero() {
    let mut b = bench();
    let rec = b.arb.step();
    assert_eq!(rec, TelemetryRecord { distance: 0, safe_speed: 0, desired: 0, cur_speed: 0 });
}

#[test]
fn test_one_press_per_cycle() {
    let mut b = bench();
    b.wiring_rest.distance_tx.send(900, 0).unwrap();

    assert_eq!(b.wiring_rest.accelerate.press(), Press::Accepted);
    b.clock.advance(250);
    assert_eq!(b.wiring_rest.accelerate.press(), Press::Accepted);

    b.arb.step();
    assert_eq!(b.arb.desired(), SpeedTier::clamped(1));
    b.arb.step();
    assert_eq!(b.arb.desired(), SpeedTier::clamped(2));
    b.arb.step();
    assert_eq!(b.arb.desired(), SpeedTier::clamped(2));
}

#[test]
fn test_brake_at_zero_stays_zero() {
    let mut b = bench();
    assert_eq!(b.wiring_rest.brake.press(), Press::Accepted);
    b.arb.step();
    assert_eq!(b.arb.desired(), SpeedTier::STOP);
}

#[test]
fn test_flag_recomputed_every_cycle() {
    let mut b = bench();

    b.wiring_rest.accelerate.press();
    b.wiring_rest.distance_tx.send(100, 0).unwrap();
    b.arb.step();
    assert!(b.wiring_rest.safety.is_raised());
    assert!(b.arb.last_decision().unwrap().hazard);

    b.wiring_rest.distance_tx.send(300, 0).unwrap();
    b.arb.step();
    assert!(!b.wiring_rest.safety.is_raised());
}

#[test]
fn test_tier_leds_follow_current_speed() {
    let mut b = bench();
    assert_eq!(lit(&b.tiers), [false, false, false]);

    b.wiring_rest.distance_tx.send(1000, 0).unwrap();
    for _ in 0..3 {
        b.wiring_rest.accelerate.press();
        b.clock.advance(300);
        b.arb.step();
    }
    assert_eq!(lit(&b.tiers), [true, true, true]);

    // Ceiling drops to tier 2: the top LED goes dark, desired is kept.
    b.wiring_rest.distance_tx.send(600, 0).unwrap();
    b.arb.step();
    assert_eq!(lit(&b.tiers), [true, true, false]);
    assert_eq!(b.arb.desired(), SpeedTier::MAX);
    assert_eq!(b.tiers[2].transitions().last(), Some(&(b.clock.now_ms(), false)));
}

#[test]
fn test_telemetry_overflow_drops() {
    let mut b = bench();
    for _ in 0..12 {
        b.arb.step();
    }
    assert_eq!(b.arb.dropped_records(), 2);

    let mut delivered = 0;
    while b.wiring_rest.telemetry_rx.recv(0).is_ok() {
        delivered += 1;
    }
    assert_eq!(delivered, 10);
}

#[test]
fn test_request_above_ceiling() {
    let mut b = bench();
    b.wiring_rest.distance_tx.send(500, 0).unwrap();
    b.wiring_rest.accelerate.press();
    b.arb.step();
    b.clock.advance(300);
    b.wiring_rest.accelerate.press();
    let rec = b.arb.step();

    assert_eq!(rec, TelemetryRecord { distance: 500, safe_speed: 1, desired: 2, cur_speed: 1 });
    assert!(b.wiring_rest.safety.is_raised());
    assert_eq!(b.wiring_rest.telemetry_rx.len(), 2);
}
