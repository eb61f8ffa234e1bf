use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, trace, warn};

use crate::chromosome::{Chromosome, ChromosomeFactory};
use crate::error::{Result, SearchError};
use crate::oracle::FitnessOracle;
use crate::population::{favour_offspring, Individual, Origin, Population};
use crate::record::{RunId, RunLogger};
use crate::rng::RandomNumberGenerator;
use crate::stats::Logbook;
use crate::tracker::OptimalSolutionTracker;
use crate::variation::Variator;

use super::{SearchConfig, SearchContext, SearchOutcome, SearchState, StopReason};

/// A (mu + lambda) genetic search over simulation parameters.
///
/// Each generation produces `lambda` offspring, evaluates them through the
/// oracle and keeps the best `mu` of incumbents and offspring, preferring
/// offspring on ties. Survivors are checkpointed after every generation and
/// any individual whose fitness exceeds `optimal_fitness` is recorded once.
///
/// At least one generation always follows the initial evaluation. After
/// each checkpoint the search stops if cancellation was requested, if an
/// optimal solution was discovered with `stop_on_optimal` set, if `max_time`
/// has elapsed, or if `max_generations` generations have completed.
pub struct GeneticSearch<O, V>
where
    O: FitnessOracle + 'static,
    V: Variator,
{
    config: SearchConfig,
    oracle: Arc<O>,
    variator: V,
    cancelled: Arc<AtomicBool>,
    pool: Option<ThreadPool>,
}

impl<O, V> GeneticSearch<O, V>
where
    O: FitnessOracle + 'static,
    V: Variator,
{
    /// Validates `config` and prepares the evaluation pool.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Configuration` when the configuration is
    /// invalid or the evaluation pool cannot be created.
    pub fn new(config: SearchConfig, oracle: O, variator: V) -> Result<Self> {
        config.validate()?;

        let pool = match config.max_concurrent_evaluations {
            Some(threads) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("simsearch-eval-{}", i))
                    .build()
                    .map_err(|e| {
                        SearchError::Configuration(format!(
                            "Failed to build evaluation pool: {}",
                            e
                        ))
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            oracle: Arc::new(oracle),
            variator,
            cancelled: Arc::new(AtomicBool::new(false)),
            pool,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn variator(&self) -> &V {
        &self.variator
    }

    /// Setting the returned flag stops the search at the end of the current
    /// generation. Evaluations already running are not interrupted.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Runs the search to completion.
    ///
    /// # Errors
    ///
    /// Any oracle, variation or I/O failure aborts the run and is returned
    /// as is. Files written up to that point are left in place.
    pub fn run(&self) -> Result<SearchOutcome> {
        let config = &self.config;
        let weight = config.weight();
        let mut state = SearchState::Init;

        let run_id = RunId::generate();
        let rng = match config.seed {
            Some(seed) => RandomNumberGenerator::from_seed(seed),
            None => RandomNumberGenerator::new(),
        };
        let factory = ChromosomeFactory::new(config.parameter_limits.clone())?;
        let mut ctx = SearchContext::new(factory, rng, config.mutation_rate, weight);

        let mut logger = RunLogger::create(
            &config.output_dir,
            &config.output_file,
            run_id,
            config.mu,
            config.lambda,
        )?;
        let mut tracker = OptimalSolutionTracker::new(config.optimal_fitness, config.dedup);
        let mut logbook = Logbook::new(config.logged_stats.clone());

        let started_at = Utc::now();
        let clock = Instant::now();
        info!(
            run_id = run_id.value(),
            mu = config.mu,
            lambda = config.lambda,
            max_generations = config.max_generations,
            parameters = ctx.factory.len(),
            "search started"
        );

        advance(&mut state, SearchState::EvaluatingInitial);
        let initial = ctx.factory.population(config.mu, &mut ctx.rng);
        let members = self.evaluate_batch(initial, Origin::Initial)?;
        let mut evaluations = members.len();
        let mut population = Population::new(config.mu);
        population.seed(members)?;

        logbook.record(0, evaluations, &population.fitnesses());
        logger.write_generation(0, population.members())?;
        record_optima(&mut tracker, &population, 0, &logger)?;
        debug!(
            generation = 0,
            evaluations,
            best = best_fitness(&population, weight),
            "initial population evaluated"
        );

        let stop_reason = loop {
            ctx.generation += 1;
            let generation = ctx.generation;

            advance(&mut state, SearchState::GeneratingOffspring);
            let offspring = self.breed(&population, &mut ctx)?;

            advance(&mut state, SearchState::EvaluatingOffspring);
            let offspring = self.evaluate_batch(offspring, Origin::Offspring)?;
            let generation_evaluations = offspring.len();
            evaluations += generation_evaluations;

            advance(&mut state, SearchState::Selecting);
            let incumbents = population.members().to_vec();
            let (next, survivors) = favour_offspring(incumbents, offspring, config.mu, weight);
            population.replace(next)?;
            logbook.record(generation, generation_evaluations, &population.fitnesses());

            advance(&mut state, SearchState::Checkpointing);
            logger.write_generation(generation, population.members())?;
            let discovered = record_optima(&mut tracker, &population, generation, &logger)?;

            info!(
                generation,
                evaluations,
                survivors,
                discovered,
                best = best_fitness(&population, weight),
                elapsed_ms = clock.elapsed().as_millis() as u64,
                "generation complete"
            );

            if let Some(reason) = self.should_stop(generation, clock.elapsed(), tracker.len()) {
                break reason;
            }
        };

        advance(&mut state, SearchState::Terminated);
        let ended_at = Utc::now();
        logger.finish(&logbook, started_at, ended_at)?;

        info!(
            run_id = run_id.value(),
            generations = ctx.generation,
            evaluations,
            optimal_solutions = tracker.len(),
            reason = %stop_reason,
            "search finished"
        );

        Ok(SearchOutcome {
            run_id,
            generations: ctx.generation,
            evaluations,
            population,
            optimal_solutions: tracker.into_solutions(),
            logbook,
            stop_reason,
            started_at,
            ended_at,
        })
    }

    fn should_stop(
        &self,
        generation: usize,
        elapsed: Duration,
        optimal_solutions: usize,
    ) -> Option<StopReason> {
        if self.cancelled.load(Ordering::SeqCst) {
            Some(StopReason::Cancelled)
        } else if self.config.stop_on_optimal && optimal_solutions > 0 {
            Some(StopReason::OptimalFound)
        } else if generation >= self.config.max_generations {
            Some(StopReason::MaxGenerations)
        } else if elapsed >= self.config.max_time {
            Some(StopReason::MaxTime)
        } else {
            None
        }
    }

    /// Produces `lambda` mutated offspring.
    fn breed(&self, population: &Population, ctx: &mut SearchContext) -> Result<Vec<Chromosome>> {
        let mut offspring = Vec::with_capacity(self.config.lambda);
        for _ in 0..self.config.lambda {
            let child = if ctx.rng.chance(self.config.random_initialisation_chance) {
                ctx.factory.random(&mut ctx.rng)
            } else {
                let parents = self.variator.select(population, 2, ctx)?;
                match parents.as_slice() {
                    [parent1, parent2] => self.variator.mate(parent1, parent2, ctx)?,
                    other => {
                        return Err(SearchError::Variation(format!(
                            "Parent selection returned {} parents, expected 2",
                            other.len()
                        )))
                    }
                }
            };
            offspring.push(child);
        }

        offspring
            .into_iter()
            .map(|child| self.variator.mutate(child, ctx))
            .collect()
    }

    /// Evaluates a batch in parallel. Results keep the batch order.
    fn evaluate_batch(&self, batch: Vec<Chromosome>, origin: Origin) -> Result<Vec<Individual>> {
        let evaluate = || {
            batch
                .into_par_iter()
                .map(|chromosome| {
                    let fitness = self.evaluate_one(&chromosome)?;
                    Ok(Individual::new(chromosome, fitness, origin))
                })
                .collect::<Result<Vec<_>>>()
        };

        match &self.pool {
            Some(pool) => pool.install(evaluate),
            None => evaluate(),
        }
    }

    fn evaluate_one(&self, chromosome: &Chromosome) -> Result<f64> {
        let fitness = match self.config.evaluation_timeout {
            Some(timeout) => evaluate_with_timeout(&self.oracle, chromosome, timeout)?,
            None => self.oracle.evaluate(chromosome)?,
        };

        if !fitness.is_finite() {
            return Err(SearchError::FitnessCalculation(format!(
                "Non-finite fitness {} for chromosome {}",
                fitness,
                chromosome.id()
            )));
        }

        if self.config.verbose {
            debug!(chromosome = chromosome.id(), genes = ?chromosome.genes(), fitness, "evaluated");
        } else {
            trace!(chromosome = chromosome.id(), fitness, "evaluated");
        }
        Ok(fitness)
    }
}

/// Runs one evaluation on its own thread and waits at most `timeout`.
///
/// On timeout the worker thread is abandoned, not killed; its result is
/// discarded when it eventually finishes.
fn evaluate_with_timeout<O>(oracle: &Arc<O>, chromosome: &Chromosome, timeout: Duration) -> Result<f64>
where
    O: FitnessOracle + 'static,
{
    let (tx, rx) = mpsc::channel();
    let oracle = Arc::clone(oracle);
    let owned = chromosome.clone();
    thread::Builder::new()
        .name(format!("simsearch-eval-{}", chromosome.id()))
        .spawn(move || {
            // The receiver is gone if the evaluation already timed out.
            let _ = tx.send(oracle.evaluate(&owned));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!(chromosome = chromosome.id(), ?timeout, "evaluation timed out");
            Err(SearchError::EvaluationTimeout {
                chromosome: chromosome.id(),
                timeout,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(SearchError::Oracle(format!(
            "Evaluation of chromosome {} panicked",
            chromosome.id()
        ))),
    }
}

fn advance(state: &mut SearchState, next: SearchState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal transition {} -> {}",
        state,
        next
    );
    trace!(from = %state, to = %next, "state transition");
    *state = next;
}

fn best_fitness(population: &Population, weight: f64) -> f64 {
    population.best(weight).map_or(f64::NAN, |b| b.fitness)
}

/// Offers every member to the tracker and persists what is new.
fn record_optima(
    tracker: &mut OptimalSolutionTracker,
    population: &Population,
    generation: usize,
    logger: &RunLogger,
) -> Result<usize> {
    let now = Utc::now();
    for member in population {
        if tracker.offer(&member.chromosome, member.fitness, generation, now) {
            info!(
                generation,
                chromosome = member.chromosome.id(),
                fitness = member.fitness,
                "optimal solution discovered"
            );
        }
    }

    let new = tracker.drain_new();
    logger.append_discoveries(new)?;
    Ok(new.len())
}
