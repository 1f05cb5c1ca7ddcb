//! Integration tests for the table-motion core.
//!
//! Exercises the motor bank and motion FSM end to end with in-memory
//! embedded-hal pins and a manually advanced clock.

use core::convert::Infallible;
use core::time::Duration;
use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};

use table_motion::{
    AxisController, AxisId, FsmState, LimitEnd, LimitSwitch, MotionFsm, MotorBank, MotorSettings,
    SystemClock,
};

// =============================================================================
// Test fixtures
// =============================================================================

/// Shared-state GPIO pin: output writes and input reads see the same level.
#[derive(Clone)]
struct TestPin {
    level: Rc<Cell<bool>>,
    rises: Rc<Cell<u64>>,
}

impl TestPin {
    /// Pin resting high (inactive for the active-low lines).
    fn high() -> Self {
        Self {
            level: Rc::new(Cell::new(true)),
            rises: Rc::new(Cell::new(0)),
        }
    }

    fn is_high_level(&self) -> bool {
        self.level.get()
    }

    fn set_level(&self, high: bool) {
        self.level.set(high);
    }

    fn rises(&self) -> u64 {
        self.rises.get()
    }
}

impl ErrorType for TestPin {
    type Error = Infallible;
}

impl OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        self.rises.set(self.rises.get() + 1);
        Ok(())
    }
}

impl InputPin for TestPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

/// Manually advanced clock.
#[derive(Clone)]
struct TestClock(Rc<Cell<u64>>);

impl TestClock {
    fn new() -> Self {
        Self(Rc::new(Cell::new(0)))
    }

    fn advance_us(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

impl SystemClock for TestClock {
    fn elapsed(&self) -> Duration {
        Duration::from_micros(self.0.get())
    }
}

struct Fixture {
    step: [TestPin; 3],
    dir: [TestPin; 3],
    enable: [TestPin; 3],
    limit_min: [TestPin; 3],
    limit_max: [TestPin; 3],
    clock: TestClock,
}

type TestBank = MotorBank<TestPin, TestPin, TestPin, TestPin, NoopDelay>;

impl Fixture {
    fn enabled(&self, axis: AxisId) -> bool {
        // Enable lines are active low
        !self.enable[axis.index()].is_high_level()
    }
}

fn make_bank() -> (TestBank, Fixture) {
    let step: [TestPin; 3] = [TestPin::high(), TestPin::high(), TestPin::high()];
    let dir: [TestPin; 3] = [TestPin::high(), TestPin::high(), TestPin::high()];
    let enable: [TestPin; 3] = [TestPin::high(), TestPin::high(), TestPin::high()];
    let limit_min: [TestPin; 3] = [TestPin::high(), TestPin::high(), TestPin::high()];
    let limit_max: [TestPin; 3] = [TestPin::high(), TestPin::high(), TestPin::high()];

    let axes = AxisId::ALL.map(|axis| {
        AxisController::new(
            step[axis.index()].clone(),
            dir[axis.index()].clone(),
            enable[axis.index()].clone(),
            NoopDelay::new(),
            MotorSettings::default_for(axis),
        )
    });

    let switches = AxisId::ALL.map(|axis| {
        LimitSwitch::new(
            limit_min[axis.index()].clone(),
            limit_max[axis.index()].clone(),
        )
    });

    let mut bank = MotorBank::new(axes, switches);
    bank.begin().unwrap();

    let fixture = Fixture {
        step,
        dir,
        enable,
        limit_min,
        limit_max,
        clock: TestClock::new(),
    };
    (bank, fixture)
}

/// Advance the bank until the axis emits one more step pulse.
fn step_once(bank: &mut TestBank, fixture: &Fixture, axis: AxisId) {
    let before = fixture.step[axis.index()].rises();
    for _ in 0..1_000_000 {
        fixture.clock.advance_us(500);
        bank.run_all(&fixture.clock).unwrap();
        if fixture.step[axis.index()].rises() > before {
            return;
        }
    }
    panic!("axis {} emitted no step", axis);
}

/// Advance the bank until every axis is at rest (or the iteration cap is
/// hit), collecting any completed retractions.
fn spin_to_rest(bank: &mut TestBank, fixture: &Fixture) -> Vec<AxisId> {
    let mut completed = Vec::new();
    for _ in 0..2_000_000 {
        fixture.clock.advance_us(500);
        let done = bank.run_all(&fixture.clock).unwrap();
        completed.extend(done.iter().copied());
        if AxisId::ALL.iter().all(|axis| !bank.is_running(*axis)) {
            // One more pass so the resolver observes the stopped state
            let done = bank.run_all(&fixture.clock).unwrap();
            completed.extend(done.iter().copied());
            break;
        }
    }
    completed
}

// =============================================================================
// Motor bank: limit handling and retraction
// =============================================================================

#[test]
fn begin_disables_all_axes() {
    let (bank, fixture) = make_bank();
    for axis in AxisId::ALL {
        assert!(!fixture.enabled(axis));
        assert!(!bank.is_running(axis));
    }
}

#[test]
fn limit_hit_starts_retraction_immediately() {
    let (mut bank, fixture) = make_bank();

    bank.on_limit_hit(AxisId::X, LimitEnd::Min).unwrap();

    assert!(bank.is_retracting(AxisId::X));
    assert!(bank.is_running(AxisId::X));
    assert!(fixture.enabled(AxisId::X));
    assert!(bank.is_limit_reached(AxisId::X, LimitEnd::Min));
    assert!(!bank.is_limit_reached(AxisId::X, LimitEnd::Max));

    // Min end retracts positive, 25 units at 100 steps/unit
    assert_eq!(bank.distance_to_go(AxisId::X), 2500);
}

#[test]
fn limit_hit_on_max_end_retracts_negative() {
    let (mut bank, _fixture) = make_bank();

    bank.on_limit_hit(AxisId::Z, LimitEnd::Max).unwrap();

    // 25 units at 8 steps/unit, away from the max end
    assert_eq!(bank.distance_to_go(AxisId::Z), -200);
}

#[test]
fn limit_hit_cancels_in_flight_motion() {
    let (mut bank, _fixture) = make_bank();

    bank.move_relative(AxisId::Y, 1000.0);
    assert_eq!(bank.distance_to_go(AxisId::Y), 8000);

    bank.on_limit_hit(AxisId::Y, LimitEnd::Max).unwrap();

    // Only the retraction remains
    assert_eq!(bank.distance_to_go(AxisId::Y), -200);
}

#[test]
fn limit_hit_ignored_while_retracting() {
    let (mut bank, _fixture) = make_bank();

    bank.on_limit_hit(AxisId::X, LimitEnd::Min).unwrap();
    let pending = bank.distance_to_go(AxisId::X);

    // A bouncing switch must not stack retractions
    bank.on_limit_hit(AxisId::X, LimitEnd::Min).unwrap();
    assert_eq!(bank.distance_to_go(AxisId::X), pending);
}

#[test]
fn retraction_resolution_clears_flags_and_disables() {
    let (mut bank, fixture) = make_bank();

    bank.on_limit_hit(AxisId::X, LimitEnd::Min).unwrap();
    let completed = spin_to_rest(&mut bank, &fixture);

    assert_eq!(completed, vec![AxisId::X]);
    assert!(!bank.is_retracting(AxisId::X));
    assert!(!bank.is_limit_reached(AxisId::X, LimitEnd::Min));
    assert!(!fixture.enabled(AxisId::X));

    // Idempotent on subsequent calls
    fixture.clock.advance_us(500);
    let again = bank.run_all(&fixture.clock).unwrap();
    assert!(again.is_empty());
}

#[test]
fn limit_triggered_reads_physical_pins() {
    let (mut bank, fixture) = make_bank();
    assert!(!bank.limit_triggered().unwrap());

    fixture.limit_max[AxisId::Y.index()].set_level(false);
    assert!(bank.limit_triggered().unwrap());

    fixture.limit_max[AxisId::Y.index()].set_level(true);
    assert!(!bank.limit_triggered().unwrap());
}

// =============================================================================
// Motion FSM: move command
// =============================================================================

#[test]
fn move_x_moves_only_x_and_enables_all() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_move(&mut bank, &["x", "10"], &mut out).unwrap();

    assert_eq!(fsm.state(), FsmState::SteppedMove);
    assert_eq!(bank.distance_to_go(AxisId::X), 1000);
    assert_eq!(bank.distance_to_go(AxisId::Y), 0);
    assert_eq!(bank.distance_to_go(AxisId::Z), 0);
    // Enable-all precedes the axis-selective move
    for axis in AxisId::ALL {
        assert!(fixture.enabled(axis));
    }
    assert!(out.contains("X=10"));

    spin_to_rest(&mut bank, &fixture);
    assert_eq!(fixture.step[AxisId::X.index()].rises(), 1000);
    assert_eq!(fixture.step[AxisId::Y.index()].rises(), 0);
    assert_eq!(fixture.step[AxisId::Z.index()].rises(), 0);

    fsm.tick(&mut bank, &mut out).unwrap();
    assert_eq!(fsm.state(), FsmState::Idle);
    assert!(out.contains("[FSM] Move complete"));
    for axis in AxisId::ALL {
        assert!(!fixture.enabled(axis));
    }
}

#[test]
fn move_all_applies_value_to_every_axis() {
    let (mut bank, _fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_move(&mut bank, &["all", "5"], &mut out).unwrap();

    assert_eq!(bank.distance_to_go(AxisId::X), 500);
    assert_eq!(bank.distance_to_go(AxisId::Y), 40);
    assert_eq!(bank.distance_to_go(AxisId::Z), 40);
    assert!(out.contains("ALL=5"));
}

#[test]
fn move_all_matches_explicit_per_axis_form() {
    let (mut bank_a, _f1) = make_bank();
    let (mut bank_b, _f2) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_move(&mut bank_a, &["all", "5"], &mut out).unwrap();
    fsm.handle_move(&mut bank_b, &["x", "5", "y", "5", "z", "5"], &mut out)
        .unwrap();

    for axis in AxisId::ALL {
        assert_eq!(bank_a.distance_to_go(axis), bank_b.distance_to_go(axis));
    }
}

#[test]
fn stepped_move_completes_only_when_all_axes_rest() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_move(&mut bank, &["x", "2", "y", "50"], &mut out)
        .unwrap();

    // Drive until X is done but Y still has distance to go
    for _ in 0..2_000_000 {
        fixture.clock.advance_us(500);
        bank.run_all(&fixture.clock).unwrap();
        if !bank.is_running(AxisId::X) {
            break;
        }
    }
    assert!(bank.is_running(AxisId::Y));

    fsm.tick(&mut bank, &mut out).unwrap();
    assert_eq!(fsm.state(), FsmState::SteppedMove);

    spin_to_rest(&mut bank, &fixture);
    fsm.tick(&mut bank, &mut out).unwrap();
    assert_eq!(fsm.state(), FsmState::Idle);
}

#[test]
fn rejected_move_changes_nothing() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    let result = fsm.handle_move(&mut bank, &["q", "5"], &mut out);
    assert!(result.is_err());
    assert_eq!(fsm.state(), FsmState::Idle);
    for axis in AxisId::ALL {
        assert!(!fixture.enabled(axis));
        assert!(!bank.is_running(axis));
    }

    // Zero valid axis tokens
    let result = fsm.handle_move(&mut bank, &[], &mut out);
    assert!(result.is_err());
    assert_eq!(fsm.state(), FsmState::Idle);
}

// =============================================================================
// Motion FSM: run and stop commands
// =============================================================================

#[test]
fn run_reverse_y_enables_only_y() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["-y"], &mut out).unwrap();

    assert_eq!(fsm.state(), FsmState::ContinuousRun);
    assert!(fixture.enabled(AxisId::Y));
    assert!(!fixture.enabled(AxisId::X));
    assert!(!fixture.enabled(AxisId::Z));
    // 100_000 units at 8 steps/unit, reversed
    assert_eq!(bank.distance_to_go(AxisId::Y), -800_000);
    assert_eq!(bank.distance_to_go(AxisId::X), 0);
    assert!(out.contains("reverse y"));
}

#[test]
fn run_all_commands_every_axis() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["all"], &mut out).unwrap();

    for axis in AxisId::ALL {
        assert!(fixture.enabled(axis));
        assert!(bank.distance_to_go(axis) > 0);
    }
    assert!(out.contains("forward all"));
}

#[test]
fn rejected_run_disables_motors() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    bank.set_all_enabled(true).unwrap();

    assert!(fsm.handle_run(&mut bank, &["w"], &mut out).is_err());
    assert_eq!(fsm.state(), FsmState::Idle);
    for axis in AxisId::ALL {
        assert!(!fixture.enabled(axis));
    }

    bank.set_all_enabled(true).unwrap();
    assert!(fsm.handle_run(&mut bank, &[], &mut out).is_err());
    assert!(!fixture.enabled(AxisId::X));
}

#[test]
fn stop_without_arguments_stops_everything() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["all"], &mut out).unwrap();
    fsm.handle_stop(&mut bank, &[], &mut out).unwrap();

    assert_eq!(fsm.state(), FsmState::Idle);
    for axis in AxisId::ALL {
        assert_eq!(bank.distance_to_go(axis), 0);
        assert!(!fixture.enabled(axis));
    }
    assert!(out.contains("Motors stopped for all"));
}

#[test]
fn partial_stop_keeps_running_axes_enabled() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["all"], &mut out).unwrap();
    fsm.handle_stop(&mut bank, &["x"], &mut out).unwrap();

    assert_eq!(fsm.state(), FsmState::Idle);
    assert!(!bank.is_running(AxisId::X));
    assert!(bank.is_running(AxisId::Y));
    assert!(bank.is_running(AxisId::Z));
    // Motors stay energized while other axes still run
    assert!(fixture.enabled(AxisId::Y));
}

#[test]
fn invalid_stop_target_changes_nothing() {
    let (mut bank, _fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["x"], &mut out).unwrap();
    assert!(fsm.handle_stop(&mut bank, &["-x"], &mut out).is_err());

    assert_eq!(fsm.state(), FsmState::ContinuousRun);
    assert!(bank.is_running(AxisId::X));
}

// =============================================================================
// Motion FSM: limit events during continuous run
// =============================================================================

#[test]
fn continuous_run_stops_on_limit_trigger() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["all"], &mut out).unwrap();

    fixture.limit_min[AxisId::X.index()].set_level(false);
    fsm.tick(&mut bank, &mut out).unwrap();

    assert_eq!(fsm.state(), FsmState::Idle);
    for axis in AxisId::ALL {
        assert_eq!(bank.distance_to_go(axis), 0);
        assert!(!fixture.enabled(axis));
    }
    assert!(out.contains("[FSM] Limit triggered - stopping"));
}

#[test]
fn continuous_run_never_self_terminates() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["y"], &mut out).unwrap();

    for _ in 0..1000 {
        fixture.clock.advance_us(500);
        bank.run_all(&fixture.clock).unwrap();
        fsm.tick(&mut bank, &mut out).unwrap();
    }
    assert_eq!(fsm.state(), FsmState::ContinuousRun);
    assert!(bank.is_running(AxisId::Y));
}

#[test]
fn retraction_defers_limit_stop_per_tick() {
    let (mut bank, fixture) = make_bank();
    let mut fsm = MotionFsm::new();
    let mut out = String::new();

    fsm.handle_run(&mut bank, &["all"], &mut out).unwrap();

    // Limit event: the pin is still held active while the axis retracts
    bank.on_limit_hit(AxisId::X, LimitEnd::Min).unwrap();
    fixture.limit_min[AxisId::X.index()].set_level(false);

    // No limit-stop while the retraction is in progress, re-checked every
    // tick
    for _ in 0..10 {
        fixture.clock.advance_us(500);
        bank.run_all(&fixture.clock).unwrap();
        fsm.tick(&mut bank, &mut out).unwrap();
        assert_eq!(fsm.state(), FsmState::ContinuousRun);
    }

    // Retraction moves the axis off the switch; finish it while the other
    // axes keep running
    fixture.limit_min[AxisId::X.index()].set_level(true);
    let mut resolved = false;
    for _ in 0..200_000 {
        fixture.clock.advance_us(500);
        let done = bank.run_all(&fixture.clock).unwrap();
        if done.contains(&AxisId::X) {
            resolved = true;
            break;
        }
    }
    assert!(resolved);

    // Pin released, retraction resolved: the run continues
    fsm.tick(&mut bank, &mut out).unwrap();
    assert_eq!(fsm.state(), FsmState::ContinuousRun);

    // A still-active switch after resolution does stop the run
    fixture.limit_max[AxisId::Z.index()].set_level(false);
    fsm.tick(&mut bank, &mut out).unwrap();
    assert_eq!(fsm.state(), FsmState::Idle);
}

// =============================================================================
// Settings and the axe command
// =============================================================================

#[test]
fn settings_round_trip() {
    let (mut bank, _fixture) = make_bank();

    let settings = MotorSettings {
        max_speed: 555.0,
        acceleration: 444.0,
        steps_per_unit: 32,
        invert_direction: true,
        enabled: false,
    };
    bank.set_motor_settings(AxisId::Y, &settings).unwrap();

    assert_eq!(bank.motor_settings(AxisId::Y), settings);
}

#[test]
fn apply_config_lands_in_motor_settings() {
    let (mut bank, _fixture) = make_bank();

    let toml = r#"
[axes.x]
max_speed = 600.0

[axes.z]
max_speed = 250.0
acceleration = 200.0
steps_per_unit = 16
invert_direction = false
"#;
    let config = table_motion::config::parse_config(toml).unwrap();
    bank.apply_config(&config).unwrap();

    let x = bank.motor_settings(AxisId::X);
    assert_eq!(x.max_speed, 600.0);
    // Fields the table omits keep the X defaults
    assert_eq!(x.steps_per_unit, 100);
    assert!(x.invert_direction);

    // Y had no table at all
    assert_eq!(bank.motor_settings(AxisId::Y), MotorSettings::default_for(AxisId::Y));

    let z = bank.motor_settings(AxisId::Z);
    assert_eq!(z.max_speed, 250.0);
    assert_eq!(z.steps_per_unit, 16);
    assert!(!z.invert_direction);
}

#[test]
fn per_field_setters_update_each_field() {
    let (mut bank, _fixture) = make_bank();

    bank.set_max_speed(AxisId::X, 650.0);
    bank.set_acceleration(AxisId::X, 500.0);
    bank.set_steps_per_unit(AxisId::X, 40);
    bank.set_inverted(AxisId::X, false);

    let settings = bank.motor_settings(AxisId::X);
    assert_eq!(settings.max_speed, 650.0);
    assert_eq!(settings.acceleration, 500.0);
    assert_eq!(settings.steps_per_unit, 40);
    assert!(!settings.invert_direction);

    // Other axes untouched
    assert_eq!(bank.motor_settings(AxisId::Y), MotorSettings::default_for(AxisId::Y));
}

#[test]
fn set_inverted_rewrites_direction_pin_on_next_step() {
    let (mut bank, fixture) = make_bank();

    // Y is non-inverted by default: a forward move drives DIR high
    bank.move_relative(AxisId::Y, 100.0);
    step_once(&mut bank, &fixture, AxisId::Y);
    assert!(fixture.dir[AxisId::Y.index()].is_high_level());
    let remaining = bank.distance_to_go(AxisId::Y);

    // Same travel direction, inverted polarity: the cached DIR level is
    // stale and must be rewritten low on the very next step
    bank.set_inverted(AxisId::Y, true);
    step_once(&mut bank, &fixture, AxisId::Y);
    assert!(!fixture.dir[AxisId::Y.index()].is_high_level());
    assert!(bank.distance_to_go(AxisId::Y) < remaining);
}

#[test]
fn settings_update_rejects_zero_steps_per_unit() {
    let (mut bank, _fixture) = make_bank();

    let mut settings = bank.motor_settings(AxisId::X);
    settings.steps_per_unit = 0;

    assert!(bank.set_motor_settings(AxisId::X, &settings).is_err());
    assert_eq!(bank.motor_settings(AxisId::X).steps_per_unit, 100);
}

#[test]
fn axe_without_pairs_reports_configuration() {
    let (mut bank, _fixture) = make_bank();
    let mut out = String::new();

    bank.configure(&["x"], &mut out).unwrap();

    assert!(out.contains("\"axis\": \"X\""));
    assert!(out.contains("\"maxSpeed\": 800"));
    assert!(out.contains("\"stepsPerUnit\": 100"));
    assert!(out.contains("\"minTriggered\": false"));
}

#[test]
fn axe_applies_pairs_and_ignores_unknown_keys() {
    let (mut bank, _fixture) = make_bank();
    let mut out = String::new();

    bank.configure(&["y", "maxSpeed=500", "bogus=7", "inverted=true"], &mut out)
        .unwrap();

    let settings = bank.motor_settings(AxisId::Y);
    assert_eq!(settings.max_speed, 500.0);
    assert!(settings.invert_direction);
    // Untouched fields survive
    assert_eq!(settings.steps_per_unit, 8);
    assert!(out.contains("[AXE] Updated axis settings."));
}

#[test]
fn axe_rejects_invalid_axis_and_values() {
    let (mut bank, _fixture) = make_bank();
    let mut out = String::new();

    assert!(bank.configure(&[], &mut out).is_err());
    assert!(bank.configure(&["w"], &mut out).is_err());
    assert!(bank.configure(&["x", "maxSpeed=fast"], &mut out).is_err());

    // Failed updates leave the settings untouched
    assert_eq!(bank.motor_settings(AxisId::X).max_speed, 800.0);
}

// =============================================================================
// Enable line polarity (pin-transaction check)
// =============================================================================

#[test]
fn enable_line_is_active_low() {
    let enable_expectations = [
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
    ];
    let mut enable = PinMock::new(&enable_expectations);
    let mut step = PinMock::new(&[]);
    let mut dir = PinMock::new(&[]);

    let mut controller = AxisController::new(
        step.clone(),
        dir.clone(),
        enable.clone(),
        NoopDelay::new(),
        MotorSettings::default_for(AxisId::X),
    );

    controller.set_enabled(true).unwrap();
    controller.set_enabled(false).unwrap();

    step.done();
    dir.done();
    enable.done();
}
