//! Per-generation CSV statistics and numbered run directories.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::evaluator::GenerationReport;

pub const STATS_FILE: &str = "training_stats.csv";
pub const STATS_HEADER: &str = "Generation,BestFitness,AverageFitness,Alive,BestControllerId";

pub struct StatsWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl StatsWriter {
    /// Creates (or truncates) the CSV and writes the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("failed creating {}", path.display()))?;
        let mut writer = Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        };
        writer.write_line(STATS_HEADER)?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes, so an interrupted run keeps its rows.
    pub fn append(&mut self, report: &GenerationReport) -> Result<()> {
        let row = format!(
            "{},{:.4},{:.4},{},{}",
            report.generation,
            report.best_fitness,
            report.average_fitness,
            report.survivors,
            report.best_controller_id
        );
        self.write_line(&row)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}")
            .and_then(|_| self.out.flush())
            .with_context(|| format!("failed writing {}", self.path.display()))
    }
}

/// One past the highest `run-<n>-data` directory under `root`; 1 when there
/// is none (or `root` does not exist yet).
pub fn next_run_number(root: &Path) -> Result<u32> {
    if !root.exists() {
        return Ok(1);
    }
    let mut highest = 0;
    let entries =
        fs::read_dir(root).with_context(|| format!("failed listing {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(n) = name.to_str().and_then(parse_run_dir_name) else {
            continue;
        };
        highest = highest.max(n);
    }
    Ok(highest + 1)
}

pub fn create_run_dir(root: &Path, run: u32) -> Result<PathBuf> {
    let dir = root.join(format!("run-{run}-data"));
    fs::create_dir_all(&dir).with_context(|| format!("failed creating {}", dir.display()))?;
    Ok(dir)
}

fn parse_run_dir_name(name: &str) -> Option<u32> {
    name.strip_prefix("run-")?
        .strip_suffix("-data")?
        .parse()
        .ok()
}
