use super::*;
use crate::body::aim_vector;
use crate::control::ActionMode;
use crate::error::ActionError;
use crate::level::{Platform, PlatformRole};

const IDLE: [f64; 2] = [0.0, 0.0];

fn params() -> SimParams {
    SimParams::default()
}

fn jump_at(deg: f64) -> [f64; 2] {
    [1.0, deg / 90.0]
}

#[test]
fn spawned_agent_rests_on_start() {
    let level = Level::fixed();
    let params = params();
    let mut sim = AgentSim::spawn(&level);
    assert!(sim.body().grounded);

    for _ in 0..10 {
        let out = sim.step(&IDLE, &level, &params);
        assert_eq!(out.collision, Collision::Land(level.start().0));
        assert!(sim.body().grounded);
        assert_eq!(sim.body().vel_x, 0.0);
        assert_eq!(sim.body().vel_y, 0.0);
        assert_eq!(sim.body().bottom(), level.start().1.top());
    }
    assert_eq!(sim.ticks(), 10);
    assert_eq!(sim.terminal(), None);
}

#[test]
fn grounded_implies_zero_velocity_after_every_landing() {
    let level = Level::fixed();
    let params = params();
    let mut sim = AgentSim::spawn(&level);
    sim.step(&jump_at(70.0), &level, &params);
    for _ in 0..200 {
        if sim.is_terminal() {
            break;
        }
        let out = sim.step(&IDLE, &level, &params);
        if matches!(out.collision, Collision::Land(_)) {
            assert!(sim.body().grounded);
            assert_eq!((sim.body().vel_x, sim.body().vel_y), (0.0, 0.0));
        } else {
            assert!(!sim.body().grounded);
        }
    }
}

#[test]
fn seventy_degree_jump_reaches_first_pad() {
    let level = Level::fixed();
    let params = params();
    let mut sim = AgentSim::spawn(&level);

    let first = sim.step(&jump_at(70.0), &level, &params);
    assert!(first.launched.is_some());
    assert!(!sim.body().grounded);

    let mut credited = None;
    for _ in 0..80 {
        let out = sim.step(&IDLE, &level, &params);
        if let Some(pad) = out.new_pad {
            credited = Some(pad);
            break;
        }
        assert_eq!(out.terminal, None, "agent must not fall off the course");
    }
    assert_eq!(credited, Some(PlatformId(1)));
    assert!(sim.ledger().is_credited(PlatformId(1)));
}

#[test]
fn pad_credit_is_not_repeated_while_resting() {
    let level = Level::fixed();
    let params = params();
    let (pad_id, pad) = level.nearest_ahead(50.0);
    let mut sim = AgentSim::with_body(AgentBody::resting_on(pad, 10.0));

    let first = sim.step(&IDLE, &level, &params);
    assert_eq!(first.new_pad, Some(pad_id));
    assert!(first.reward >= params.reward.pad_bonus);

    for _ in 0..20 {
        let out = sim.step(&IDLE, &level, &params);
        assert_eq!(out.new_pad, None);
        assert!(out.reward < params.reward.pad_bonus);
    }
}

#[test]
fn landing_on_end_terminates_with_goal_bonus() {
    let level = Level::fixed();
    let params = params();
    let (end_id, end) = level.end();
    let mut body = AgentBody::new(end.left() + 10.0, end.top() - 25.0);
    body.vel_y = 2.0;
    let mut sim = AgentSim::with_body(body);

    let mut total = 0.0;
    let mut goal_ticks = 0;
    for _ in 0..10 {
        if sim.is_terminal() {
            break;
        }
        let out = sim.step(&IDLE, &level, &params);
        total += out.reward;
        if out.terminal == Some(Terminal::Goal) {
            goal_ticks += 1;
            assert_eq!(out.collision, Collision::Land(end_id));
        }
    }

    assert_eq!(goal_ticks, 1);
    assert_eq!(sim.terminal(), Some(Terminal::Goal));
    assert!(total >= params.reward.goal_bonus);
}

#[test]
fn falling_below_floor_is_out_of_bounds() {
    let level = Level::fixed();
    let params = params();
    let mut body = AgentBody::new(600.0, 648.0);
    body.vel_y = 5.0;
    let mut sim = AgentSim::with_body(body);

    let out = sim.step(&IDLE, &level, &params);
    assert_eq!(out.terminal, Some(Terminal::OutOfBounds));
    assert_eq!(sim.terminal(), Some(Terminal::OutOfBounds));
    assert!(out.reward < 0.0);
}

#[test]
fn malformed_output_drops_agent() {
    let level = Level::fixed();
    let params = params();
    let mut sim = AgentSim::spawn(&level);
    let before = *sim.body();

    let out = sim.step(&[0.5, f64::NAN], &level, &params);
    assert_eq!(out.rejected, Some(ActionError::NonFinite { index: 1 }));
    assert_eq!(out.terminal, Some(Terminal::OutOfBounds));
    assert_eq!(out.reward, -params.reward.out_of_bounds_penalty);
    assert_eq!(*sim.body(), before, "no physics runs for rejected output");

    let mut sim = AgentSim::spawn(&level);
    let out = sim.step(&[1.0, 0.0, 0.0], &level, &params);
    assert_eq!(
        out.rejected,
        Some(ActionError::WrongLength {
            expected: 2,
            actual: 3
        })
    );
}

#[test]
fn terminate_keeps_first_terminal() {
    let level = Level::fixed();
    let mut sim = AgentSim::spawn(&level);
    sim.terminate(Terminal::Culled);
    sim.terminate(Terminal::Timeout);
    assert_eq!(sim.terminal(), Some(Terminal::Culled));
}

#[test]
fn side_hit_between_disjoint_platforms_slides() {
    let level = Level::from_tuples(&[
        (0.0, 500.0, 100.0, 20.0, PlatformRole::Start),
        (200.0, 400.0, 100.0, 60.0, PlatformRole::Pad),
        (400.0, 500.0, 100.0, 20.0, PlatformRole::End),
    ])
    .expect("test level");
    let params = params();
    let mut body = AgentBody::new(172.0, 420.0);
    body.vel_x = 10.0;
    body.vel_y = -3.0;
    let mut sim = AgentSim::with_body(body);

    let out = sim.step(&IDLE, &level, &params);
    assert_eq!(out.collision, Collision::Slide(PlatformId(1)));
    assert!(!sim.body().grounded);
    assert_eq!(sim.body().vel_x, 10.0 * params.physics.slide_friction);
}

#[test]
fn replay_is_deterministic() {
    let level = Level::fixed();
    let params = params();
    let mut actions = vec![jump_at(70.0).to_vec()];
    actions.extend(std::iter::repeat(IDLE.to_vec()).take(120));
    actions.push(jump_at(65.0).to_vec());
    actions.extend(std::iter::repeat(IDLE.to_vec()).take(120));

    let a = replay(&level, &params, &actions);
    let b = replay(&level, &params, &actions);
    assert_eq!(a, b);
    assert!(a.pads_credited >= 1);
}

#[test]
fn checkpoints_cover_first_and_last_tick() {
    let level = Level::fixed();
    let params = params();
    let actions: Vec<Vec<f64>> = std::iter::repeat(IDLE.to_vec()).take(25).collect();
    let checkpoints = replay_with_checkpoints(&level, &params, &actions, 10);
    let ticks: Vec<u32> = checkpoints.iter().map(|c| c.tick).collect();
    assert_eq!(ticks, vec![0, 10, 20, 25]);
    assert!(checkpoints.iter().all(|c| c.grounded || c.tick == 0));
}

#[test]
fn invalid_params_are_rejected() {
    let mut params = params();
    params.physics.land_tolerance_px = 0.0;
    assert!(params.validate().is_err());
    assert!(SimParams::default().validate().is_ok());
}

#[test]
fn custom_body_on_custom_platform() {
    let platform = Platform::new(0.0, 100.0, 50.0, 10.0, PlatformRole::Start);
    let body = AgentBody::resting_on(&platform, 5.0);
    let sim = AgentSim::with_body(body);
    assert_eq!(sim.snapshot().y, 80.0);
    assert!(sim.snapshot().grounded);
}

#[test]
fn charge_mode_holds_on_the_ledge_then_launches_on_release() {
    let level = Level::fixed();
    let mut params = params();
    params.control.action = ActionMode::Charge;
    let mut sim = AgentSim::spawn(&level);
    let hold = [1.0, 0.0];

    for tick in 0..20 {
        let out = sim.step(&hold, &level, &params);
        assert_eq!(out.launched, None, "tick {tick} must not launch");
        assert_eq!(out.collision, Collision::Land(level.start().0));
        assert!(sim.body().grounded);
        assert!(sim.body().is_charging());
    }
    let AimState::Charging { elapsed, .. } = sim.body().aim else {
        panic!("body must still be charging");
    };
    assert_eq!(elapsed, 19);

    let out = sim.step(&IDLE, &level, &params);
    let expected = aim_vector(elapsed, &params.aim);
    assert_eq!(out.launched, Some(expected));
    assert!(expected.0 > 0.0 && expected.1 < 0.0);
    assert_eq!(out.collision, Collision::None);
    assert!(!sim.body().grounded);
    assert_eq!(sim.body().aim, AimState::Idle);
    assert_eq!(sim.terminal(), None);
}

#[test]
fn charge_mode_auto_releases_at_max_charge() {
    let level = Level::fixed();
    let mut params = params();
    params.control.action = ActionMode::Charge;
    params.aim.max_charge_ticks = 30;
    let mut sim = AgentSim::spawn(&level);

    let mut launched_at = None;
    for tick in 1..=40 {
        if sim.step(&[1.0, 0.0], &level, &params).launched.is_some() {
            launched_at = Some(tick);
            break;
        }
    }
    assert_eq!(launched_at, Some(31));
    assert!(!sim.body().grounded);
}
