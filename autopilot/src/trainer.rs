//! Multi-generation training run: evaluate, record, breed, repeat.

use anyhow::{Context, Result};
use platformer_core::level::Level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::SimConfig;
use crate::controller::FeedForwardPolicy;
use crate::evaluator::{EvaluationContext, GenerationReport, PopulationEvaluator};
use crate::evolve::Search;
use crate::stats::{StatsWriter, STATS_FILE};
use crate::util::{now_unix_s, write_json_pretty};

pub const BEST_POLICY_FILE: &str = "best_policy.json";
pub const CONTEXT_FILE: &str = "context.json";
pub const CONFIG_FILE: &str = "config.json";
pub const LEVEL_FILE: &str = "level.json";

/// Written next to the stats after every generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingCheckpoint {
    pub updated_unix_s: u64,
    pub generations_run: u32,
    pub context: EvaluationContext,
    pub last_best_fitness: f64,
    pub last_average_fitness: f64,
}

#[derive(Clone, Debug)]
pub struct TrainingSummary {
    pub out_dir: PathBuf,
    pub context: EvaluationContext,
    pub reports: Vec<GenerationReport>,
    /// Present once any generation produced a new best.
    pub best_policy: Option<PathBuf>,
}

pub fn train(
    level: &Level,
    config: &SimConfig,
    out_dir: &Path,
    seed_policy: Option<FeedForwardPolicy>,
) -> Result<TrainingSummary> {
    let evaluator = PopulationEvaluator::new(level, config)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed creating {}", out_dir.display()))?;
    write_json_pretty(&out_dir.join(CONFIG_FILE), config)?;
    write_json_pretty(&out_dir.join(LEVEL_FILE), level)?;

    let mut stats = StatsWriter::create(&out_dir.join(STATS_FILE))?;
    let mut search = Search::new(config.search);
    let mut controllers = match seed_policy {
        Some(policy) => search.population_from(policy),
        None => search.initial_population(),
    };
    let mut ctx = EvaluationContext::new();
    let mut reports = Vec::with_capacity(config.search.generations as usize);
    let mut best_policy = None;
    let best_path = out_dir.join(BEST_POLICY_FILE);

    for _ in 0..config.search.generations {
        let report = evaluator.run_generation(&mut controllers, &mut ctx)?;
        stats.append(&report)?;

        if report.new_best {
            if let Some(best) = controllers
                .iter()
                .find(|c| Some(c.id()) == ctx.best_controller_id)
            {
                best.policy().save(&best_path)?;
                best_policy = Some(best_path.clone());
                tracing::info!(
                    "generation {}: new best {:.3} from controller {}, saved {}",
                    report.generation,
                    best.fitness(),
                    best.id(),
                    best_path.display()
                );
            }
        }

        write_json_pretty(
            &out_dir.join(CONTEXT_FILE),
            &TrainingCheckpoint {
                updated_unix_s: now_unix_s(),
                generations_run: ctx.generation,
                context: ctx.clone(),
                last_best_fitness: report.best_fitness,
                last_average_fitness: report.average_fitness,
            },
        )?;

        controllers = search.breed(controllers);
        reports.push(report);
    }

    Ok(TrainingSummary {
        out_dir: out_dir.to_path_buf(),
        context: ctx,
        reports,
        best_policy,
    })
}
