use super::*;
use platformer_core::level::PlatformRole;

type Boxed = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

fn idle() -> Boxed {
    Box::new(|_: &[f64]| vec![0.0, 0.0])
}

fn jumper(aim: f64) -> Boxed {
    Box::new(move |_: &[f64]| vec![1.0, aim])
}

fn broken() -> Boxed {
    Box::new(|_: &[f64]| vec![f64::NAN, 0.0])
}

fn population(policies: Vec<Boxed>) -> Vec<Controller<Boxed>> {
    policies
        .into_iter()
        .enumerate()
        .map(|(id, policy)| Controller::new(id as u64, policy))
        .collect()
}

fn config(max_ticks: u32, cull_every_ticks: u32, min_population: usize) -> SimConfig {
    let mut config = SimConfig::default();
    config.evaluator.max_ticks = max_ticks;
    config.evaluator.cull_interval_secs =
        f64::from(cull_every_ticks) / f64::from(config.evaluator.fps);
    config.evaluator.min_population = min_population;
    config.evaluator.jobs = Some(2);
    config
}

/// Start ledge and an end ledge a single 45 degree jump away.
fn short_course() -> Level {
    Level::from_tuples(&[
        (0.0, 560.0, 100.0, 20.0, PlatformRole::Start),
        (380.0, 560.0, 100.0, 20.0, PlatformRole::End),
    ])
    .expect("short course")
}

#[test]
fn idle_population_times_out_at_tick_budget() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &config(50, 1000, 2)).unwrap();
    let mut controllers = population((0..6).map(|_| idle()).collect());
    let mut ctx = EvaluationContext::new();

    let report = evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(report.ticks, 50);
    assert_eq!(report.counts.timeout, 6);
    assert_eq!(report.survivors, 6);
    assert!(report.culls.is_empty());
    for (idx, outcome) in report.outcomes.iter().enumerate() {
        assert_eq!(outcome.spawn_index, idx);
        assert_eq!(outcome.terminal, Terminal::Timeout);
        assert!((outcome.fitness - 0.5).abs() < 1e-9);
    }
    assert_eq!(ctx.generation, 1);
    assert_eq!(ctx.best_controller_id, Some(0));
}

#[test]
fn culling_removes_lower_half_with_stable_ties() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &config(25, 10, 2)).unwrap();
    let mut controllers = population((0..10).map(|_| idle()).collect());
    let mut ctx = EvaluationContext::new();

    let report = evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(report.culls.len(), 2);
    assert_eq!(report.culls[0].tick, 10);
    assert_eq!(report.culls[0].live_before, 10);
    assert_eq!(report.culls[0].removed, vec![5, 6, 7, 8, 9]);
    assert_eq!(report.culls[1].tick, 20);
    assert_eq!(report.culls[1].live_before, 5);
    assert_eq!(report.culls[1].removed, vec![3, 4]);
    assert_eq!(report.counts.culled, 7);
    assert_eq!(report.counts.timeout, 3);
    assert_eq!(report.ticks, 25);
}

#[test]
fn culling_stops_at_population_floor() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &config(40, 10, 4)).unwrap();
    let mut controllers = population((0..8).map(|_| idle()).collect());
    let mut ctx = EvaluationContext::new();

    let report = evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(report.culls.len(), 1);
    assert_eq!(report.counts.culled, 4);
    assert_eq!(report.counts.timeout, 4);
}

#[test]
fn culling_ranks_by_accumulated_fitness() {
    let evaluator = PopulationEvaluator::new(&short_course(), &config(20, 10, 1)).unwrap();
    // The 45 degree jumpers earn progress reward while airborne.
    let mut controllers = population(vec![idle(), jumper(0.5), idle(), jumper(0.5)]);
    let mut ctx = EvaluationContext::new();

    let report = evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(report.culls[0].removed, vec![0, 2]);
    assert_eq!(report.outcomes[0].terminal, Terminal::Culled);
    assert_eq!(report.outcomes[1].terminal, Terminal::Timeout);
}

#[test]
fn malformed_output_drops_agent_as_out_of_bounds() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &config(30, 1000, 1)).unwrap();
    let mut controllers = population(vec![idle(), broken(), idle(), broken()]);
    let mut ctx = EvaluationContext::new();

    let mut generation = evaluator.start(&mut controllers).unwrap();
    assert!(generation.tick(&mut ctx));
    assert_eq!(generation.live_count(), 2);
    assert_eq!(generation.status(0), Some(AgentStatus::Alive));
    assert_eq!(
        generation.status(1),
        Some(AgentStatus::Terminal(Terminal::OutOfBounds))
    );
    while generation.tick(&mut ctx) {}
    let report = generation.finish(&mut ctx);

    assert_eq!(report.counts.out_of_bounds, 2);
    assert_eq!(report.counts.invalid_output, 2);
    assert!(report.outcomes[1].invalid_output);
    assert_eq!(report.outcomes[1].ticks, 1);
    assert_eq!(report.outcomes[1].fitness, -20.0);
}

#[test]
fn out_of_bounds_agent_leaves_live_set_the_same_tick() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &config(300, 1000, 1)).unwrap();
    // Repeated flat launches walk the agent off the start ledge.
    let mut controllers = population(vec![jumper(0.0), idle()]);
    let mut ctx = EvaluationContext::new();

    let mut generation = evaluator.start(&mut controllers).unwrap();
    let mut fell_at = None;
    while generation.tick(&mut ctx) {
        if generation.status(0) == Some(AgentStatus::Terminal(Terminal::OutOfBounds)) {
            fell_at = Some(generation.ticks());
            assert_eq!(generation.live_count(), 1);
            break;
        }
        assert_eq!(generation.live_count(), 2);
    }
    assert_eq!(fell_at, Some(29));
    let report = generation.finish(&mut ctx);
    assert_eq!(report.outcomes[0].ticks, 29);
    assert_eq!(report.outcomes[1].terminal, Terminal::Timeout);
}

#[test]
fn goal_is_recorded_in_context() {
    let evaluator = PopulationEvaluator::new(&short_course(), &config(200, 1000, 1)).unwrap();
    let mut controllers = population(vec![jumper(0.5), idle()]);
    let mut ctx = EvaluationContext::new();

    let report = evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(report.outcomes[0].terminal, Terminal::Goal);
    assert_eq!(report.outcomes[0].ticks, 45);
    assert!(report.outcomes[0].fitness > 100.0);
    assert_eq!(report.best_controller_id, 0);
    assert!(report.new_best);
    assert_eq!(ctx.goals_total, 1);
    assert_eq!(ctx.first_goal_generation, Some(0));

    let report = evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(report.generation, 1);
    assert!(!report.new_best, "identical rerun cannot beat the best");
    assert_eq!(ctx.goals_total, 2);
    assert_eq!(ctx.first_goal_generation, Some(0));
}

#[test]
fn controllers_are_reset_between_generations() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &config(10, 1000, 1)).unwrap();
    let mut controllers = population(vec![idle()]);
    let mut ctx = EvaluationContext::new();

    evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    let first = controllers[0].fitness();
    evaluator.run_generation(&mut controllers, &mut ctx).unwrap();
    assert_eq!(controllers[0].fitness(), first);
}

#[test]
fn empty_population_is_an_error() {
    let evaluator = PopulationEvaluator::new(&Level::fixed(), &SimConfig::default()).unwrap();
    let mut controllers: Vec<Controller<Boxed>> = Vec::new();
    let mut ctx = EvaluationContext::new();
    assert!(evaluator.run_generation(&mut controllers, &mut ctx).is_err());
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = SimConfig::default();
    config.physics.land_tolerance_px = -1.0;
    assert!(PopulationEvaluator::new(&Level::fixed(), &config).is_err());
}
