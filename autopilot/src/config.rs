use anyhow::{anyhow, Result};
use platformer_core::body::AimConfig;
use platformer_core::constants::{
    DEFAULT_CULL_INTERVAL_SECS, DEFAULT_MAX_TICKS, DEFAULT_MIN_POPULATION, TICKS_PER_SECOND,
};
use platformer_core::control::ControlConfig;
use platformer_core::fitness::RewardConfig;
use platformer_core::sim::{PhysicsConfig, SimParams};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::util::read_json;

pub const DEFAULT_POPULATION: usize = 50;
pub const DEFAULT_GENERATIONS: u32 = 30;
pub const DEFAULT_HIDDEN_UNITS: usize = 8;
pub const DEFAULT_ELITE_FRACTION: f64 = 0.2;
pub const DEFAULT_MUTATION_RATE: f64 = 0.3;
pub const DEFAULT_MUTATION_SCALE: f64 = 0.5;
pub const DEFAULT_SEARCH_SEED: u32 = 0x5EED_0001;

/// Generation loop limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Simulated ticks per second; converts the cull interval into ticks.
    pub fps: u32,
    pub max_ticks: u32,
    /// Simulated seconds between culls.
    pub cull_interval_secs: f64,
    /// Culling stops once the live set is at or below this size.
    pub min_population: usize,
    /// Optional real-time budget per generation.
    pub max_wall_secs: Option<f64>,
    /// Fixed rayon pool size; `None` uses the global pool.
    pub jobs: Option<usize>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            fps: TICKS_PER_SECOND,
            max_ticks: DEFAULT_MAX_TICKS,
            cull_interval_secs: DEFAULT_CULL_INTERVAL_SECS,
            min_population: DEFAULT_MIN_POPULATION,
            max_wall_secs: None,
            jobs: None,
        }
    }
}

impl EvaluatorConfig {
    /// Ticks between culls, at least one.
    pub fn cull_interval_ticks(&self) -> u32 {
        let ticks = (self.cull_interval_secs * f64::from(self.fps)).round();
        if ticks < 1.0 {
            1
        } else {
            ticks as u32
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub population: usize,
    pub generations: u32,
    pub hidden_units: usize,
    pub elite_fraction: f64,
    /// Per-weight probability of a Gaussian nudge.
    pub mutation_rate: f64,
    pub mutation_scale: f64,
    pub seed: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            generations: DEFAULT_GENERATIONS,
            hidden_units: DEFAULT_HIDDEN_UNITS,
            elite_fraction: DEFAULT_ELITE_FRACTION,
            mutation_rate: DEFAULT_MUTATION_RATE,
            mutation_scale: DEFAULT_MUTATION_SCALE,
            seed: DEFAULT_SEARCH_SEED,
        }
    }
}

/// Full configuration file. Every section and field is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub aim: AimConfig,
    pub reward: RewardConfig,
    pub control: ControlConfig,
    pub evaluator: EvaluatorConfig,
    pub search: SearchConfig,
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// Defaults or the given file, then environment overrides, then validation.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        let evaluator = &mut self.evaluator;
        evaluator.max_ticks = read_env_u32("PLATFORMER_MAX_TICKS", evaluator.max_ticks);
        evaluator.cull_interval_secs =
            read_env_f64("PLATFORMER_CULL_INTERVAL_SECS", evaluator.cull_interval_secs);
        evaluator.min_population =
            read_env_usize("PLATFORMER_MIN_POPULATION", evaluator.min_population);
    }

    pub fn params(&self) -> SimParams {
        SimParams {
            physics: self.physics,
            aim: self.aim,
            reward: self.reward,
            control: self.control,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.params().validate()?;

        let evaluator = &self.evaluator;
        if evaluator.fps == 0 {
            return Err(anyhow!("evaluator.fps must be > 0"));
        }
        if evaluator.max_ticks == 0 {
            return Err(anyhow!("evaluator.max_ticks must be > 0"));
        }
        if !(evaluator.cull_interval_secs > 0.0) {
            return Err(anyhow!("evaluator.cull_interval_secs must be > 0"));
        }
        if let Some(secs) = evaluator.max_wall_secs {
            if !(secs > 0.0) {
                return Err(anyhow!("evaluator.max_wall_secs must be > 0 when set"));
            }
        }
        if evaluator.jobs == Some(0) {
            return Err(anyhow!("evaluator.jobs must be > 0 when set"));
        }

        let search = &self.search;
        if search.population == 0 {
            return Err(anyhow!("search.population must be > 0"));
        }
        if !(search.elite_fraction > 0.0 && search.elite_fraction <= 1.0) {
            return Err(anyhow!("search.elite_fraction must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&search.mutation_rate) {
            return Err(anyhow!("search.mutation_rate must be in [0, 1]"));
        }
        if !(search.mutation_scale >= 0.0) {
            return Err(anyhow!("search.mutation_scale must be >= 0"));
        }
        if evaluator.min_population >= search.population {
            tracing::warn!(
                "min_population ({}) >= population ({}); culling will never run",
                evaluator.min_population,
                search.population
            );
        }
        Ok(())
    }
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(default)
}
