//! Controllers: a policy that maps observations to actions, plus the
//! per-generation fitness and landing record of the agent it drives.

use anyhow::{anyhow, Result};
use platformer_core::fitness::PadLedger;
use platformer_core::rng::SeededRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::util::{read_json, write_json_pretty};

/// Pure observation -> action mapping. Called once per tick per agent, from
/// worker threads.
pub trait Policy: Send + Sync {
    fn activate(&self, observation: &[f64]) -> Vec<f64>;
}

impl<F> Policy for F
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    fn activate(&self, observation: &[f64]) -> Vec<f64> {
        self(observation)
    }
}

/// Fully connected net with one tanh hidden layer and sigmoid outputs.
///
/// Weight rows carry a trailing bias term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardPolicy {
    inputs: usize,
    hidden: usize,
    outputs: usize,
    hidden_weights: Vec<f64>,
    output_weights: Vec<f64>,
}

impl FeedForwardPolicy {
    pub fn random(rng: &mut SeededRng, inputs: usize, hidden: usize, outputs: usize) -> Self {
        let hidden_weights = (0..hidden * (inputs + 1))
            .map(|_| rng.next_range_f64(-1.0, 1.0))
            .collect();
        let output_weights = (0..outputs * (hidden + 1))
            .map(|_| rng.next_range_f64(-1.0, 1.0))
            .collect();
        Self {
            inputs,
            hidden,
            outputs,
            hidden_weights,
            output_weights,
        }
    }

    /// Copy with each weight nudged by `N(0, scale)` with probability `rate`.
    pub fn mutated(&self, rng: &mut SeededRng, rate: f64, scale: f64) -> Self {
        let mut child = self.clone();
        for weight in child
            .hidden_weights
            .iter_mut()
            .chain(child.output_weights.iter_mut())
        {
            if rng.next_f64() < rate {
                *weight += rng.next_gaussian() * scale;
            }
        }
        child
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    pub fn weight_count(&self) -> usize {
        self.hidden_weights.len() + self.output_weights.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_pretty(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let policy: Self = read_json(path)?;
        policy.check_shape()?;
        Ok(policy)
    }

    fn check_shape(&self) -> Result<()> {
        if self.hidden_weights.len() != self.hidden * (self.inputs + 1) {
            return Err(anyhow!(
                "hidden layer has {} weights, expected {}",
                self.hidden_weights.len(),
                self.hidden * (self.inputs + 1)
            ));
        }
        if self.output_weights.len() != self.outputs * (self.hidden + 1) {
            return Err(anyhow!(
                "output layer has {} weights, expected {}",
                self.output_weights.len(),
                self.outputs * (self.hidden + 1)
            ));
        }
        let mut weights = self.hidden_weights.iter().chain(&self.output_weights);
        if weights.any(|w| !w.is_finite()) {
            return Err(anyhow!("policy contains non-finite weights"));
        }
        Ok(())
    }
}

impl Policy for FeedForwardPolicy {
    /// Wrong-length observations yield an empty action, which the simulation
    /// rejects.
    fn activate(&self, observation: &[f64]) -> Vec<f64> {
        if observation.len() != self.inputs {
            return Vec::new();
        }
        let hidden: Vec<f64> = self
            .hidden_weights
            .chunks_exact(self.inputs + 1)
            .map(|row| weighted_sum(row, observation).tanh())
            .collect();
        self.output_weights
            .chunks_exact(self.hidden + 1)
            .map(|row| sigmoid(weighted_sum(row, &hidden)))
            .collect()
    }
}

#[inline]
fn weighted_sum(row: &[f64], values: &[f64]) -> f64 {
    let (bias, weights) = match row.split_last() {
        Some((bias, weights)) => (*bias, weights),
        None => return 0.0,
    };
    weights
        .iter()
        .zip(values)
        .fold(bias, |acc, (w, v)| acc + w * v)
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A policy taking part in one generation.
///
/// Fitness only accumulates while the generation runs; a new generation
/// starts from a fresh `Controller`.
#[derive(Clone, Debug)]
pub struct Controller<P> {
    id: u64,
    policy: P,
    fitness: f64,
    pads: PadLedger,
}

impl<P: Policy> Controller<P> {
    pub fn new(id: u64, policy: P) -> Self {
        Self {
            id,
            policy,
            fitness: 0.0,
            pads: PadLedger::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Pads this controller's agent was credited for in the last generation.
    pub fn pads(&self) -> &PadLedger {
        &self.pads
    }

    pub fn into_policy(self) -> P {
        self.policy
    }

    pub(crate) fn reset(&mut self) {
        self.fitness = 0.0;
        self.pads = PadLedger::new();
    }

    pub(crate) fn accumulate(&mut self, reward: f64) {
        self.fitness += reward;
    }

    pub(crate) fn record_pads(&mut self, pads: &PadLedger) {
        self.pads = pads.clone();
    }
}
