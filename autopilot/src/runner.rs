//! Headless playback of a single policy.

use anyhow::Result;
use platformer_core::collision::Collision;
use platformer_core::fitness::Terminal;
use platformer_core::level::Level;
use platformer_core::sim::{AgentSim, AgentSnapshot};
use serde::Serialize;
use std::path::Path;

use crate::config::SimConfig;
use crate::controller::Policy;
use crate::util::write_json_pretty;

#[derive(Clone, Debug, Serialize)]
pub struct TraceFrame {
    #[serde(flatten)]
    pub snapshot: AgentSnapshot,
    pub action: Vec<f64>,
    pub reward: f64,
    pub collision: Collision,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlaybackResult {
    pub ticks: u32,
    pub fitness: f64,
    pub pads_credited: usize,
    pub terminal: Terminal,
    pub invalid_output: bool,
    pub trace: Vec<TraceFrame>,
}

/// Runs one agent until it terminates or `max_ticks` pass. Uses the same
/// observation and tick order as training.
pub fn play_policy<P: Policy>(
    policy: &P,
    level: &Level,
    config: &SimConfig,
    max_ticks: u32,
) -> Result<PlaybackResult> {
    config.validate()?;
    let params = config.params();
    let mut sim = AgentSim::spawn(level);
    let mut fitness = 0.0;
    let mut invalid_output = false;
    let mut trace = Vec::new();

    while !sim.is_terminal() && sim.ticks() < max_ticks {
        let observation = sim.observe(level, &params.control);
        let action = policy.activate(&observation);
        let outcome = sim.step(&action, level, &params);
        fitness += outcome.reward;
        invalid_output |= outcome.rejected.is_some();
        trace.push(TraceFrame {
            snapshot: sim.snapshot(),
            action,
            reward: outcome.reward,
            collision: outcome.collision,
        });
    }
    sim.terminate(Terminal::Timeout);

    Ok(PlaybackResult {
        ticks: sim.ticks(),
        fitness,
        pads_credited: sim.ledger().credited_count(),
        terminal: sim.terminal().unwrap_or(Terminal::Timeout),
        invalid_output,
        trace,
    })
}

pub fn write_trace(path: &Path, trace: &[TraceFrame]) -> Result<()> {
    write_json_pretty(path, trace)
}
