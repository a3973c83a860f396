//! Lockstep evaluation of one generation.
//!
//! Every tick has two phases. First all live agents advance in parallel, each
//! touching only its own body and controller. Then a single thread retires
//! terminated agents, runs culling when due and enforces the tick and
//! wall-clock budgets. Only the second phase writes the shared
//! [`EvaluationContext`].

use anyhow::{anyhow, Context, Result};
use platformer_core::error::ActionError;
use platformer_core::fitness::Terminal;
use platformer_core::level::Level;
use platformer_core::sim::{AgentSim, SimParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{EvaluatorConfig, SimConfig};
use crate::controller::{Controller, Policy};
use crate::culling::CullingPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentStatus {
    Alive,
    Terminal(Terminal),
}

/// Cross-generation state, threaded explicitly through every generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Index of the next generation to run.
    pub generation: u32,
    pub best_fitness: Option<f64>,
    pub best_controller_id: Option<u64>,
    pub first_goal_generation: Option<u32>,
    pub goals_total: u64,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `fitness` beats the running best.
    pub fn observe(&mut self, controller_id: u64, fitness: f64) -> bool {
        if self.best_fitness.is_some_and(|best| fitness <= best) {
            return false;
        }
        self.best_fitness = Some(fitness);
        self.best_controller_id = Some(controller_id);
        true
    }

    fn record_goal(&mut self) {
        self.goals_total += 1;
        self.first_goal_generation.get_or_insert(self.generation);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub spawn_index: usize,
    pub controller_id: u64,
    pub fitness: f64,
    pub terminal: Terminal,
    pub ticks: u32,
    pub pads_credited: usize,
    /// The agent was dropped for malformed controller output.
    pub invalid_output: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CullEvent {
    pub tick: u32,
    pub live_before: usize,
    pub removed: Vec<u64>,
    /// Highest fitness among the removed agents.
    pub cutoff_fitness: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationCounts {
    pub goal: usize,
    pub out_of_bounds: usize,
    pub culled: usize,
    pub timeout: usize,
    pub invalid_output: usize,
}

impl TerminationCounts {
    fn add(&mut self, outcome: &AgentOutcome) {
        match outcome.terminal {
            Terminal::Goal => self.goal += 1,
            Terminal::OutOfBounds => self.out_of_bounds += 1,
            Terminal::Culled => self.culled += 1,
            Terminal::Timeout => self.timeout += 1,
        }
        if outcome.invalid_output {
            self.invalid_output += 1;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub ticks: u32,
    pub wall_secs: f64,
    /// One entry per controller, in spawn order.
    pub outcomes: Vec<AgentOutcome>,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub best_controller_id: u64,
    /// Agents that were neither culled nor out of bounds at generation end.
    pub survivors: usize,
    pub counts: TerminationCounts,
    pub culls: Vec<CullEvent>,
    /// This generation raised the running best.
    pub new_best: bool,
}

pub struct PopulationEvaluator {
    level: Level,
    params: SimParams,
    limits: EvaluatorConfig,
    culling: CullingPolicy,
    cull_every: u32,
    pool: Option<rayon::ThreadPool>,
}

impl PopulationEvaluator {
    pub fn new(level: &Level, config: &SimConfig) -> Result<Self> {
        if level.is_empty() {
            return Err(anyhow!("level has no platforms"));
        }
        config.validate()?;

        let pool = match config.evaluator.jobs {
            Some(jobs) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()
                    .context("failed to build rayon threadpool")?,
            ),
            None => None,
        };

        Ok(Self {
            level: level.clone(),
            params: config.params(),
            limits: config.evaluator,
            culling: CullingPolicy::new(config.evaluator.min_population),
            cull_every: config.evaluator.cull_interval_ticks(),
            pool,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Spawns one agent per controller on the start platform. Controller
    /// fitness and pad records are reset.
    pub fn start<'g, P: Policy>(
        &'g self,
        controllers: &'g mut [Controller<P>],
    ) -> Result<Generation<'g, P>> {
        if controllers.is_empty() {
            return Err(anyhow!("population must be > 0"));
        }
        let live: Vec<Agent<'g, P>> = controllers
            .iter_mut()
            .enumerate()
            .map(|(spawn_index, controller)| {
                controller.reset();
                Agent {
                    spawn_index,
                    controller,
                    sim: AgentSim::spawn(&self.level),
                    rejected: None,
                }
            })
            .collect();
        let population = live.len();

        Ok(Generation {
            evaluator: self,
            live,
            statuses: vec![AgentStatus::Alive; population],
            outcomes: vec![None; population],
            culls: Vec::new(),
            tick: 0,
            new_best: false,
            started: Instant::now(),
        })
    }

    /// Runs a whole generation to completion and advances `ctx.generation`.
    pub fn run_generation<P: Policy>(
        &self,
        controllers: &mut [Controller<P>],
        ctx: &mut EvaluationContext,
    ) -> Result<GenerationReport> {
        let mut generation = self.start(controllers)?;
        while generation.tick(ctx) {}
        Ok(generation.finish(ctx))
    }
}

struct Agent<'g, P> {
    spawn_index: usize,
    controller: &'g mut Controller<P>,
    sim: AgentSim,
    rejected: Option<ActionError>,
}

impl<P: Policy> Agent<'_, P> {
    fn advance(&mut self, level: &Level, params: &SimParams) {
        let observation = self.sim.observe(level, &params.control);
        let action = self.controller.policy().activate(&observation);
        let outcome = self.sim.step(&action, level, params);
        self.controller.accumulate(outcome.reward);
        self.rejected = outcome.rejected;
    }
}

/// A generation in progress.
pub struct Generation<'g, P> {
    evaluator: &'g PopulationEvaluator,
    live: Vec<Agent<'g, P>>,
    statuses: Vec<AgentStatus>,
    outcomes: Vec<Option<AgentOutcome>>,
    culls: Vec<CullEvent>,
    tick: u32,
    new_best: bool,
    started: Instant,
}

impl<'g, P: Policy> Generation<'g, P> {
    pub fn ticks(&self) -> u32 {
        self.tick
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn status(&self, spawn_index: usize) -> Option<AgentStatus> {
        self.statuses.get(spawn_index).copied()
    }

    pub fn culls(&self) -> &[CullEvent] {
        &self.culls
    }

    /// Advances every live agent by one tick. Returns `false` once the
    /// generation is over.
    pub fn tick(&mut self, ctx: &mut EvaluationContext) -> bool {
        if self.live.is_empty() {
            return false;
        }
        self.tick += 1;

        let evaluator = self.evaluator;
        let level = &evaluator.level;
        let params = &evaluator.params;
        let advance = |agent: &mut Agent<'g, P>| agent.advance(level, params);
        match &evaluator.pool {
            Some(pool) => pool.install(|| self.live.par_iter_mut().for_each(advance)),
            None => self.live.par_iter_mut().for_each(advance),
        }

        self.retire_terminated(ctx);

        if self.tick % evaluator.cull_every == 0 {
            self.cull(ctx);
        }

        if self.budget_exhausted() {
            self.timeout_remaining(ctx);
        }

        !self.live.is_empty()
    }

    /// Ends the generation. Agents still alive are timed out.
    pub fn finish(mut self, ctx: &mut EvaluationContext) -> GenerationReport {
        self.timeout_remaining(ctx);

        let outcomes: Vec<AgentOutcome> = self.outcomes.into_iter().flatten().collect();
        let mut counts = TerminationCounts::default();
        for outcome in &outcomes {
            counts.add(outcome);
        }

        // Earliest spawn wins ties.
        let (best_fitness, best_controller_id) = outcomes
            .iter()
            .reduce(|best, o| if o.fitness > best.fitness { o } else { best })
            .map_or((0.0, 0), |o| (o.fitness, o.controller_id));
        let average_fitness =
            outcomes.iter().map(|o| o.fitness).sum::<f64>() / outcomes.len().max(1) as f64;

        let report = GenerationReport {
            generation: ctx.generation,
            ticks: self.tick,
            wall_secs: self.started.elapsed().as_secs_f64(),
            best_fitness,
            average_fitness,
            best_controller_id,
            survivors: counts.goal + counts.timeout,
            counts,
            culls: self.culls,
            new_best: self.new_best,
            outcomes,
        };

        tracing::info!(
            "generation {} done: ticks={} best={:.3} (controller {}) avg={:.3} goal={} oob={} culled={} timeout={}",
            report.generation,
            report.ticks,
            report.best_fitness,
            report.best_controller_id,
            report.average_fitness,
            counts.goal,
            counts.out_of_bounds,
            counts.culled,
            counts.timeout,
        );

        ctx.generation += 1;
        report
    }

    fn budget_exhausted(&self) -> bool {
        if self.tick >= self.evaluator.limits.max_ticks {
            return true;
        }
        self.evaluator
            .limits
            .max_wall_secs
            .is_some_and(|secs| self.started.elapsed().as_secs_f64() >= secs)
    }

    fn cull(&mut self, ctx: &mut EvaluationContext) {
        let fitness: Vec<f64> = self.live.iter().map(|a| a.controller.fitness()).collect();
        let removed = self.evaluator.culling.select(&fitness);
        if removed.is_empty() {
            return;
        }

        let mut event = CullEvent {
            tick: self.tick,
            live_before: self.live.len(),
            removed: Vec::with_capacity(removed.len()),
            cutoff_fitness: f64::NEG_INFINITY,
        };
        for idx in removed {
            let agent = &mut self.live[idx];
            agent.sim.terminate(Terminal::Culled);
            event.removed.push(agent.controller.id());
            event.cutoff_fitness = event.cutoff_fitness.max(fitness[idx]);
        }
        tracing::debug!(
            "tick {}: culled {} of {} agents (cutoff fitness {:.3})",
            event.tick,
            event.removed.len(),
            event.live_before,
            event.cutoff_fitness
        );
        self.culls.push(event);
        self.retire_terminated(ctx);
    }

    fn timeout_remaining(&mut self, ctx: &mut EvaluationContext) {
        for agent in &mut self.live {
            agent.sim.terminate(Terminal::Timeout);
        }
        self.retire_terminated(ctx);
    }

    /// Compacts the live set, keeping spawn order, and records every agent
    /// that reached a terminal state.
    fn retire_terminated(&mut self, ctx: &mut EvaluationContext) {
        if !self.live.iter().any(|agent| agent.sim.is_terminal()) {
            return;
        }
        let (finished, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.live)
            .into_iter()
            .partition(|agent| agent.sim.is_terminal());
        self.live = live;

        for agent in finished {
            self.retire(agent, ctx);
        }
    }

    fn retire(&mut self, agent: Agent<'g, P>, ctx: &mut EvaluationContext) {
        let Agent {
            spawn_index,
            controller,
            sim,
            rejected,
        } = agent;
        let Some(terminal) = sim.terminal() else {
            return;
        };

        if let Some(err) = rejected {
            tracing::warn!(
                "tick {}: controller {} dropped: {}",
                self.tick,
                controller.id(),
                err
            );
        } else {
            tracing::debug!(
                "tick {}: controller {} ended as {} with fitness {:.3}",
                self.tick,
                controller.id(),
                terminal.as_str(),
                controller.fitness()
            );
        }

        controller.record_pads(sim.ledger());
        if terminal == Terminal::Goal {
            ctx.record_goal();
        }
        if ctx.observe(controller.id(), controller.fitness()) {
            self.new_best = true;
        }

        self.statuses[spawn_index] = AgentStatus::Terminal(terminal);
        self.outcomes[spawn_index] = Some(AgentOutcome {
            spawn_index,
            controller_id: controller.id(),
            fitness: controller.fitness(),
            terminal,
            ticks: sim.ticks(),
            pads_credited: sim.ledger().credited_count(),
            invalid_output: rejected.is_some(),
        });
    }
}

#[cfg(test)]
mod tests;
