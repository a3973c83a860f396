use platformer_core::collision::Collision;
use platformer_core::fitness::Terminal;
use platformer_core::sim::{replay, replay_with_checkpoints, AgentSim, SimParams};
use platformer_core::{AgentBody, Level, LevelError, PlatformId, PlatformRole};

fn idle(n: usize) -> Vec<Vec<f64>> {
    std::iter::repeat(vec![0.0, 0.0]).take(n).collect()
}

fn jump(deg: f64) -> Vec<f64> {
    vec![1.0, deg / 90.0]
}

#[test]
fn level_json_round_trips_through_serde() {
    let level = Level::fixed();
    let json = serde_json::to_string(&level).expect("serialize level");
    let parsed: Level = serde_json::from_str(&json).expect("parse level");
    assert_eq!(parsed, level);
}

#[test]
fn level_json_without_size_uses_world_defaults() {
    let json = r#"{
        "platforms": [
            [0.0, 560.0, 100.0, 20.0, "start"],
            [200.0, 460.0, 100.0, 20.0, "pad"],
            [400.0, 560.0, 100.0, 20.0, "end"]
        ]
    }"#;
    let level: Level = serde_json::from_str(json).expect("parse level");
    assert_eq!(level.width(), 1400.0);
    assert_eq!(level.height(), 600.0);
    assert_eq!(level.pad_count(), 1);
    assert_eq!(level.end().0, PlatformId(2));
}

#[test]
fn level_json_without_end_is_rejected() {
    let json = r#"{ "platforms": [[0.0, 560.0, 100.0, 20.0, "start"]] }"#;
    let err = serde_json::from_str::<Level>(json).expect_err("no end platform");
    assert!(err.to_string().contains(&LevelError::MissingEnd.to_string()));
}

#[test]
fn fixed_course_replay_is_stable_across_runs() {
    let level = Level::fixed();
    let params = SimParams::default();
    let mut actions = vec![jump(70.0)];
    actions.extend(idle(90));
    actions.push(jump(60.0));
    actions.extend(idle(90));

    let first = replay(&level, &params, &actions);
    let second = replay(&level, &params, &actions);
    assert_eq!(first, second);

    let checkpoints = replay_with_checkpoints(&level, &params, &actions, 30);
    assert_eq!(checkpoints.first().expect("checkpoint").tick, 0);
    assert_eq!(checkpoints.last().expect("checkpoint").tick, first.ticks);
    assert_eq!(
        checkpoints.last().expect("checkpoint").pads_credited,
        first.pads_credited
    );
}

#[test]
fn standing_still_until_timeout_earns_only_alive_bonus() {
    let level = Level::fixed();
    let params = SimParams::default();
    let result = replay(&level, &params, &idle(100));
    assert_eq!(result.ticks, 100);
    assert_eq!(result.terminal, None);
    assert_eq!(result.pads_credited, 0);
    assert!((result.fitness - 100.0 * params.reward.alive_bonus).abs() < 1e-9);
}

#[test]
fn walking_off_a_pad_falls_out_of_the_world() {
    // Nothing lies below the right edge of the pad at y=460.
    let level = Level::from_tuples(&[
        (0.0, 560.0, 100.0, 20.0, PlatformRole::Start),
        (200.0, 460.0, 100.0, 20.0, PlatformRole::Pad),
        (400.0, 560.0, 100.0, 20.0, PlatformRole::End),
    ])
    .expect("test level");
    let params = SimParams::default();

    let mut sim = AgentSim::with_body(AgentBody::new(305.0, 440.0));

    let mut last = None;
    for _ in 0..200 {
        let out = sim.step(&[0.0, 0.0], &level, &params);
        assert_eq!(out.collision, Collision::None);
        if out.terminal.is_some() {
            last = out.terminal;
            break;
        }
    }
    assert_eq!(last, Some(Terminal::OutOfBounds));
    assert_eq!(sim.ledger().credited_count(), 0);
}
