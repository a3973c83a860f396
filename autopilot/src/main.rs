use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use platformer_autopilot::config::SimConfig;
use platformer_autopilot::controller::FeedForwardPolicy;
use platformer_autopilot::runner::{play_policy, write_trace};
use platformer_autopilot::stats::{create_run_dir, next_run_number};
use platformer_autopilot::trainer::train;
use platformer_autopilot::util::{parse_seed, read_json, seed_to_hex};
use platformer_core::level::Level;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "platformer-autopilot")]
#[command(about = "Headless population training and playback for the jump-pad platformer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the level as JSON
    Level {
        #[arg(long)]
        level: Option<PathBuf>,
    },
    /// Evolve a population of policies over several generations
    Train {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        level: Option<PathBuf>,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        population: Option<usize>,
        /// Search seed, decimal or 0x hex
        #[arg(long)]
        seed: Option<String>,
        /// Continue from a stored policy instead of a random population
        #[arg(long)]
        from: Option<PathBuf>,
        /// Output directory; defaults to the next log/run-<n>-data
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Run one stored policy headlessly
    Play {
        #[arg(long)]
        policy: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        level: Option<PathBuf>,
        #[arg(long)]
        max_ticks: Option<u32>,
        /// Write the per-tick trace as JSON
        #[arg(long)]
        trace: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match Cli::parse().command {
        Commands::Level { level } => {
            let level = load_level(level.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&level)?);
        }
        Commands::Train {
            config,
            level,
            generations,
            population,
            seed,
            from,
            out_dir,
            jobs,
        } => {
            let mut config = SimConfig::resolve(config.as_deref())?;
            if let Some(generations) = generations {
                config.search.generations = generations;
            }
            if let Some(population) = population {
                config.search.population = population;
            }
            if let Some(seed) = seed {
                config.search.seed = parse_seed(&seed)?;
            }
            if jobs.is_some() {
                config.evaluator.jobs = jobs;
            }
            config.validate()?;

            let level = load_level(level.as_deref())?;
            let seed_policy = from.as_deref().map(FeedForwardPolicy::load).transpose()?;
            let out_dir = match out_dir {
                Some(dir) => dir,
                None => {
                    let root = Path::new("log");
                    create_run_dir(root, next_run_number(root)?)?
                }
            };

            tracing::info!(
                "training: generations={} population={} seed={} max_ticks={} out_dir={}",
                config.search.generations,
                config.search.population,
                seed_to_hex(config.search.seed),
                config.evaluator.max_ticks,
                out_dir.display()
            );
            let summary = train(&level, &config, &out_dir, seed_policy)?;

            println!("generations={}", summary.reports.len());
            println!("population={}", config.search.population);
            println!("seed={}", seed_to_hex(config.search.seed));
            match summary.context.best_fitness {
                Some(best) => println!("best_fitness={best:.3}"),
                None => println!("best_fitness=none"),
            }
            if let Some(id) = summary.context.best_controller_id {
                println!("best_controller={id}");
            }
            println!("goals={}", summary.context.goals_total);
            if let Some(gen) = summary.context.first_goal_generation {
                println!("first_goal_generation={gen}");
            }
            if let Some(path) = &summary.best_policy {
                println!("best_policy={}", path.display());
            }
            println!("out_dir={}", summary.out_dir.display());
        }
        Commands::Play {
            policy,
            config,
            level,
            max_ticks,
            trace,
        } => {
            let config = SimConfig::resolve(config.as_deref())?;
            let level = load_level(level.as_deref())?;
            let stored = FeedForwardPolicy::load(&policy)?;
            let max_ticks = max_ticks.unwrap_or(config.evaluator.max_ticks);
            if max_ticks == 0 {
                return Err(anyhow!("max_ticks must be > 0"));
            }

            let result = play_policy(&stored, &level, &config, max_ticks)?;
            println!("policy={}", policy.display());
            println!("ticks={}", result.ticks);
            println!("outcome={}", result.terminal.as_str());
            println!("fitness={:.3}", result.fitness);
            println!("pads={}/{}", result.pads_credited, level.pad_count());
            if result.invalid_output {
                println!("invalid_output=true");
            }
            if let Some(path) = trace {
                write_trace(&path, &result.trace)?;
                println!("trace={}", path.display());
            }
        }
    }

    Ok(())
}

fn load_level(path: Option<&Path>) -> Result<Level> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Level::fixed()),
    }
}
