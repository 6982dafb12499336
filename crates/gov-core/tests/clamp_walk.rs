use gov_core::{arbitrate, SpeedDelta, SpeedTier};

// Walk a long, lopsided press sequence and check the invariants at every step.
#[test]
fn test_setting_stays_in_range() {
    let pattern = [
        SpeedDelta::Accelerate, SpeedDelta::Accelerate, SpeedDelta::Accelerate,
        SpeedDelta::Accelerate, SpeedDelta::Accelerate, SpeedDelta::Hold,
        SpeedDelta::Brake, SpeedDelta::Brake, SpeedDelta::Brake, SpeedDelta::Brake,
        SpeedDelta::Brake, SpeedDelta::Brake, SpeedDelta::Accelerate,
    ];

    let mut desired = SpeedTier::STOP;
    for (i, delta) in pattern.iter().cycle().take(200).enumerate() {
        let distance = (i as i32 * 37) % 1024;
        let d = arbitrate(distance, desired, Some(*delta));

        assert!(d.desired <= SpeedTier::MAX);
        assert_eq!(d.current, core::cmp::min(d.safe, d.desired));
        assert_eq!(d.hazard, d.desired > d.safe);
        desired = d.desired;
    }
}

#[test]
fn test_saturation_edges() {
    let d = arbitrate(900, SpeedTier::MAX, Some(SpeedDelta::Accelerate));
    assert_eq!(d.desired, SpeedTier::MAX);

    let d = arbitrate(900, SpeedTier::STOP, Some(SpeedDelta::Brake));
    assert_eq!(d.desired, SpeedTier::STOP);
}
