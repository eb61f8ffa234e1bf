//! # Run records
//!
//! Every search writes four files:
//!
//! - `<output_dir>/ga_temp/<run_id>.csv`: checkpoint, one block per
//!   generation listing each surviving individual.
//! - `<output_dir>/ga_temp/optimal_solutions_discovered.csv`: one line per
//!   newly discovered optimal solution, shared by all runs in the directory.
//! - `<output_dir>/<output_file>`: the logbook table, appended when the run
//!   ends.
//! - `<output_dir>/search_times.csv`: start, end and duration of the run.
//!
//! The checkpoint is flushed after every generation so an interrupted run
//! leaves a readable prefix behind.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::chromosome::ParameterValue;
use crate::error::{Result, ResultExt, SearchError};
use crate::population::Individual;
use crate::stats::Logbook;
use crate::tracker::OptimalSolution;

pub const TEMP_DIR: &str = "ga_temp";
pub const DISCOVERIES_FILE: &str = "optimal_solutions_discovered.csv";
pub const TIMES_FILE: &str = "search_times.csv";

/// Identifies one search run; names its checkpoint file.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

impl RunId {
    /// A fresh 63-bit id from operating-system entropy.
    pub fn generate() -> Self {
        Self(OsRng.next_u64() >> 1)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn join_genes(genes: &[ParameterValue], sep: &str) -> String {
    genes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

/// `\tChromosome_ID,<id>,Parameters,<p0>,...,Fitness,<f>`
pub fn format_individual(individual: &Individual) -> String {
    let chromosome = &individual.chromosome;
    format!(
        "\tChromosome_ID,{},Parameters,{},Fitness,{:?}",
        chromosome.id(),
        join_genes(chromosome.genes(), ","),
        individual.fitness
    )
}

pub fn format_generation_header(generation: usize, mu: usize, lambda: usize) -> String {
    if generation == 0 {
        format!("SimulationGA,generation,0,mu,{},lambda,{}", mu, lambda)
    } else {
        format!("SimulationGA,generation,{}", generation)
    }
}

pub fn format_discovery(run_id: RunId, solution: &OptimalSolution) -> String {
    format!(
        "SimulationGAseed,{},Solution_Parameters,[{}],Fitness,{:?},Discovered_Generation,{},Discovered_Time,{}",
        run_id,
        join_genes(solution.chromosome.genes(), ", "),
        solution.fitness,
        solution.generation,
        rfc3339(&solution.discovered_at)
    )
}

fn append_to(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context(format!("Failed to open {}", path.display()))
}

/// Writes the files of one run.
#[derive(Debug)]
pub struct RunLogger {
    run_id: RunId,
    mu: usize,
    lambda: usize,
    checkpoint_path: PathBuf,
    checkpoint: BufWriter<File>,
    discoveries_path: PathBuf,
    summary_path: PathBuf,
    times_path: PathBuf,
}

impl RunLogger {
    /// Creates the temp directory and the run's checkpoint file.
    ///
    /// # Errors
    ///
    /// `SearchError::RunCollision` if a checkpoint for `run_id` already
    /// exists; `SearchError::Io` for any other filesystem failure.
    pub fn create(
        output_dir: &Path,
        output_file: &str,
        run_id: RunId,
        mu: usize,
        lambda: usize,
    ) -> Result<Self> {
        let temp_dir = output_dir.join(TEMP_DIR);
        fs::create_dir_all(&temp_dir)?;

        let checkpoint_path = temp_dir.join(format!("{}.csv", run_id));
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&checkpoint_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(SearchError::RunCollision(
                    checkpoint_path.display().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let discoveries_path = temp_dir.join(DISCOVERIES_FILE);
        append_to(&discoveries_path)?;

        debug!(run_id = run_id.value(), path = %checkpoint_path.display(), "checkpoint created");

        Ok(Self {
            run_id,
            mu,
            lambda,
            checkpoint_path,
            checkpoint: BufWriter::new(file),
            discoveries_path,
            summary_path: output_dir.join(output_file),
            times_path: output_dir.join(TIMES_FILE),
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn discoveries_path(&self) -> &Path {
        &self.discoveries_path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    pub fn times_path(&self) -> &Path {
        &self.times_path
    }

    /// Writes one generation block and flushes it.
    pub fn write_generation(&mut self, generation: usize, members: &[Individual]) -> Result<()> {
        writeln!(
            self.checkpoint,
            "{}",
            format_generation_header(generation, self.mu, self.lambda)
        )?;
        for individual in members {
            writeln!(self.checkpoint, "{}", format_individual(individual))?;
        }
        self.checkpoint.flush()?;
        Ok(())
    }

    /// Appends discoveries; does nothing for an empty slice.
    pub fn append_discoveries(&self, solutions: &[OptimalSolution]) -> Result<()> {
        if solutions.is_empty() {
            return Ok(());
        }
        let mut out = BufWriter::new(append_to(&self.discoveries_path)?);
        for solution in solutions {
            writeln!(out, "{}", format_discovery(self.run_id, solution))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Appends the logbook table and the timing record.
    pub fn finish(
        mut self,
        logbook: &Logbook,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        self.checkpoint.flush()?;

        let mut summary = append_to(&self.summary_path)?;
        writeln!(summary, "{}", logbook)?;

        let total = (ended_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let mut times = append_to(&self.times_path)?;
        writeln!(
            times,
            "ga_seed,{},started_at,{},ended_at,{},total_time,{}",
            self.run_id,
            rfc3339(&started_at),
            rfc3339(&ended_at),
            total
        )?;
        Ok(())
    }
}
