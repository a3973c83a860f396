//! Minimal generational search over [`FeedForwardPolicy`] weights: keep an
//! elite by fitness, refill with mutated copies of elites.

use platformer_core::constants::{ACTION_LEN, OBSERVATION_LEN};
use platformer_core::rng::SeededRng;

use crate::config::SearchConfig;
use crate::controller::{Controller, FeedForwardPolicy};

pub struct Search {
    config: SearchConfig,
    rng: SeededRng,
    next_id: u64,
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            rng: SeededRng::new(config.seed),
            config,
            next_id: 0,
        }
    }

    pub fn initial_population(&mut self) -> Vec<Controller<FeedForwardPolicy>> {
        (0..self.config.population)
            .map(|_| {
                let policy = FeedForwardPolicy::random(
                    &mut self.rng,
                    OBSERVATION_LEN,
                    self.config.hidden_units,
                    ACTION_LEN,
                );
                self.spawn(policy)
            })
            .collect()
    }

    /// Population seeded from one stored policy: the policy itself plus
    /// mutated copies.
    pub fn population_from(&mut self, seed: FeedForwardPolicy) -> Vec<Controller<FeedForwardPolicy>> {
        let mut out = Vec::with_capacity(self.config.population);
        out.push(self.spawn(seed));
        while out.len() < self.config.population {
            let child = out[0].policy().mutated(
                &mut self.rng,
                self.config.mutation_rate,
                self.config.mutation_scale,
            );
            out.push(self.spawn(child));
        }
        out
    }

    /// At least one elite, never more than the population (zero for an
    /// empty one).
    pub fn elite_count(&self) -> usize {
        let count = (self.config.population as f64 * self.config.elite_fraction).ceil() as usize;
        count.max(1).min(self.config.population)
    }

    /// Next generation from an evaluated one. Elites keep their ids; children
    /// get fresh ones.
    pub fn breed(
        &mut self,
        evaluated: Vec<Controller<FeedForwardPolicy>>,
    ) -> Vec<Controller<FeedForwardPolicy>> {
        let mut ranked = evaluated;
        ranked.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        ranked.truncate(self.elite_count());
        if ranked.is_empty() {
            return self.initial_population();
        }

        let elites: Vec<(u64, FeedForwardPolicy)> = ranked
            .into_iter()
            .map(|controller| (controller.id(), controller.into_policy()))
            .collect();

        let mut next = Vec::with_capacity(self.config.population);
        for (id, policy) in &elites {
            next.push(Controller::new(*id, policy.clone()));
        }
        while next.len() < self.config.population {
            let parent = &elites[self.rng.next_index(elites.len())].1;
            let child = parent.mutated(
                &mut self.rng,
                self.config.mutation_rate,
                self.config.mutation_scale,
            );
            next.push(self.spawn(child));
        }
        next
    }

    fn spawn(&mut self, policy: FeedForwardPolicy) -> Controller<FeedForwardPolicy> {
        let id = self.next_id;
        self.next_id += 1;
        Controller::new(id, policy)
    }
}
