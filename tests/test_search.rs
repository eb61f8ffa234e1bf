use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use simsearch::{
    chromosome::{Chromosome, ParameterSpec, ParameterValue},
    error::{Result, SearchError},
    oracle::{FitnessOracle, FnOracle},
    record::{DISCOVERIES_FILE, TEMP_DIR, TIMES_FILE},
    search::{GeneticSearch, SearchConfig, StopReason},
    stats::Statistic,
    tracker::DedupPolicy,
    variation::{BoundedVariator, ParentSelection, PlaceholderVariator},
};
use tracing::Level;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn int_value(chromosome: &Chromosome) -> Result<f64> {
    match chromosome.gene(0) {
        Some(ParameterValue::Int(v)) => Ok(v as f64),
        other => Err(SearchError::Oracle(format!("unexpected gene {:?}", other))),
    }
}

/// Fitness is the single integer gene; every evaluated value is remembered.
#[derive(Debug, Clone, Default)]
struct RecordingOracle {
    seen: Arc<Mutex<Vec<f64>>>,
}

impl FitnessOracle for RecordingOracle {
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64> {
        let value = int_value(chromosome)?;
        self.seen
            .lock()
            .map_err(|_| SearchError::Oracle("poisoned".to_string()))?
            .push(value);
        Ok(value)
    }
}

fn scenario_config(dir: &Path) -> SearchConfig {
    SearchConfig::builder()
        .mu(4)
        .lambda(2)
        .max_generations(1)
        .optimal_fitness(5.0)
        .parameter(ParameterSpec::int("n", 0, 10))
        .output_dir(dir)
        .seed(2024)
        .build()
        .unwrap()
}

fn discovered_vectors(dir: &Path) -> Vec<String> {
    let contents = fs::read_to_string(dir.join(TEMP_DIR).join(DISCOVERIES_FILE)).unwrap();
    contents
        .lines()
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields[0], "SimulationGAseed");
            assert_eq!(fields[2], "Solution_Parameters");
            fields[3].to_string()
        })
        .collect()
}

#[test]
fn test_scenario_keeps_best_and_records_optima_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let oracle = RecordingOracle::default();
    let seen = Arc::clone(&oracle.seen);

    let search = GeneticSearch::new(scenario_config(dir.path()), oracle, PlaceholderVariator).unwrap();
    let outcome = search.run().unwrap();

    assert_eq!(outcome.generations, 1);
    assert_eq!(outcome.evaluations, 6);
    assert_eq!(outcome.stop_reason, StopReason::MaxGenerations);

    // The population holds the four best values seen across both batches.
    let mut seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 6);
    seen.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let mut kept = outcome.population.fitnesses();
    kept.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(kept, seen[..4].to_vec());

    // Every surviving value above the threshold is in the discoveries file once.
    let vectors = discovered_vectors(dir.path());
    for member in outcome.population.iter().filter(|m| m.fitness > 5.0) {
        let expected = format!("[{}]", member.chromosome.genes()[0]);
        assert_eq!(vectors.iter().filter(|v| **v == expected).count(), 1);
    }
    assert_eq!(vectors.len(), outcome.optimal_solutions.len());
    assert!(outcome.optimal_solutions.iter().all(|s| s.fitness > 5.0));
}

#[test]
fn test_single_generation_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let search = GeneticSearch::new(
        scenario_config(dir.path()),
        FnOracle::new(int_value),
        PlaceholderVariator,
    )
    .unwrap();
    let outcome = search.run().unwrap();

    let checkpoint = dir
        .path()
        .join(TEMP_DIR)
        .join(format!("{}.csv", outcome.run_id));
    let contents = fs::read_to_string(checkpoint).unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "SimulationGA,generation,0,mu,4,lambda,2");
    assert_eq!(lines[5], "SimulationGA,generation,1");
    assert!(!contents.contains("SimulationGA,generation,2"));

    for line in lines.iter().filter(|l| l.starts_with('\t')) {
        let fields: Vec<&str> = line.trim_start().split(',').collect();
        assert_eq!(fields[0], "Chromosome_ID");
        assert!(fields[1].parse::<u64>().is_ok());
        assert_eq!(fields[2], "Parameters");
        let value: i64 = fields[3].parse().unwrap();
        assert!((0..=10).contains(&value));
        assert_eq!(fields[4], "Fitness");
        assert_eq!(fields[5].parse::<f64>().unwrap(), value as f64);
    }
}

#[test]
fn test_summary_and_times_appended() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder()
        .mu(3)
        .lambda(2)
        .max_generations(2)
        .parameter(ParameterSpec::int("n", 0, 10))
        .output_dir(dir.path())
        .output_file("summary.tsv")
        .logged_stats(vec![Statistic::Mean, Statistic::Max])
        .build()
        .unwrap();

    for _ in 0..2 {
        let search =
            GeneticSearch::new(config.clone(), FnOracle::new(int_value), PlaceholderVariator)
                .unwrap();
        search.run().unwrap();
    }

    let summary = fs::read_to_string(dir.path().join("summary.tsv")).unwrap();
    assert_eq!(summary.matches("generation\tevaluations\tmean\tmax").count(), 2);
    assert!(summary.contains("\n0\t3\t"));
    assert!(summary.contains("\n2\t2\t"));

    let times = fs::read_to_string(dir.path().join(TIMES_FILE)).unwrap();
    let lines: Vec<&str> = times.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields[0], "ga_seed");
        assert_eq!(fields[2], "started_at");
        assert_eq!(fields[4], "ended_at");
        assert_eq!(fields[6], "total_time");
        assert!(fields[7].parse::<f64>().unwrap() >= 0.0);
    }

    // Two runs, two checkpoints.
    let checkpoints = fs::read_dir(dir.path().join(TEMP_DIR))
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .map(|e| e.file_name() != DISCOVERIES_FILE)
                .unwrap_or(false)
        })
        .count();
    assert_eq!(checkpoints, 2);
}

#[test]
fn test_same_seed_same_search() {
    let run = || {
        let dir = tempfile::tempdir().unwrap();
        let config = SearchConfig::builder()
            .mu(6)
            .lambda(4)
            .max_generations(8)
            .seed(99)
            .mutation_rate(0.5)
            .parameter(ParameterSpec::int("a", -50, 50))
            .parameter(ParameterSpec::float("b", 0.0, 1.0))
            .output_dir(dir.path())
            .build()
            .unwrap();
        let oracle = FnOracle::new(|c: &Chromosome| {
            let v = c.values();
            Ok(-(v[0] - 7.0).abs() + v[1])
        });
        let variator =
            BoundedVariator::new().with_selection(ParentSelection::Tournament { size: 2 });
        let outcome = GeneticSearch::new(config, oracle, variator)
            .unwrap()
            .run()
            .unwrap();
        outcome
            .population
            .iter()
            .map(|m| (m.chromosome.id(), m.chromosome.genes().to_vec(), m.fitness))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_bounded_variator_improves_on_smooth_landscape() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder()
        .mu(10)
        .lambda(10)
        .max_generations(40)
        .seed(5)
        .mutation_rate(0.5)
        .optimal_fitness(-0.5)
        .parameter(ParameterSpec::float("x", -10.0, 10.0))
        .output_dir(dir.path())
        .build()
        .unwrap();
    let oracle = FnOracle::new(|c: &Chromosome| Ok(-(c.values()[0] - 3.0).abs()));
    let search = GeneticSearch::new(
        config,
        oracle,
        BoundedVariator::new().with_selection(ParentSelection::Tournament { size: 3 }),
    )
    .unwrap();
    let outcome = search.run().unwrap();

    let first = outcome.logbook.records()[0].clone();
    let last = outcome.logbook.last().unwrap();
    let max_first = outcome.logbook.value(&first, Statistic::Max).unwrap();
    let max_last = outcome.logbook.value(last, Statistic::Max).unwrap();
    assert!(max_last >= max_first);
    assert!(max_last > -0.5);
    assert!(!outcome.optimal_solutions.is_empty());
    assert!(outcome
        .population
        .iter()
        .all(|m| (-10.0..=10.0).contains(&m.chromosome.values()[0])));
}

#[test]
fn test_minimisation_weight() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder()
        .mu(4)
        .lambda(4)
        .max_generations(15)
        .seed(8)
        .fitness_weights(vec![-1.0])
        .optimal_fitness(f64::INFINITY)
        .parameter(ParameterSpec::int("n", 0, 100))
        .output_dir(dir.path())
        .build()
        .unwrap();
    let outcome = GeneticSearch::new(config, FnOracle::new(int_value), PlaceholderVariator)
        .unwrap()
        .run()
        .unwrap();

    let records = outcome.logbook.records();
    let min_first = outcome.logbook.value(&records[0], Statistic::Min).unwrap();
    let min_last = outcome
        .logbook
        .value(&records[records.len() - 1], Statistic::Min)
        .unwrap();
    assert!(min_last <= min_first);
    assert!(outcome.optimal_solutions.is_empty());
}

#[test]
fn test_widest_int_bounds_survive_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder()
        .mu(6)
        .lambda(6)
        .max_generations(5)
        .seed(8)
        .mutation_rate(1.0)
        .optimal_fitness(f64::INFINITY)
        .parameter(ParameterSpec::int("n", i64::MIN, i64::MAX))
        .output_dir(dir.path())
        .build()
        .unwrap();
    let oracle = FnOracle::new(|c: &Chromosome| Ok(c.values()[0] / 1e18));

    let outcome = GeneticSearch::new(config, oracle, BoundedVariator::new())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.generations, 5);
    assert!(outcome
        .population
        .iter()
        .all(|m| matches!(m.chromosome.gene(0), Some(ParameterValue::Int(_)))));
}

#[test]
fn test_stop_on_optimal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.max_generations = 100;
    config.optimal_fitness = -1.0;
    config.stop_on_optimal = true;

    let outcome = GeneticSearch::new(config, FnOracle::new(int_value), PlaceholderVariator)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.stop_reason, StopReason::OptimalFound);
    assert_eq!(outcome.generations, 1);
    assert!(!outcome.optimal_solutions.is_empty());
}

#[test]
fn test_single_generation_regardless_of_time_budget() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.max_time = Duration::ZERO;

    let outcome = GeneticSearch::new(config, FnOracle::new(int_value), PlaceholderVariator)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.generations, 1);
    assert_eq!(outcome.evaluations, 4 + 2);
    assert_eq!(outcome.logbook.len(), 2);
}

#[test]
fn test_zero_time_budget_stops_after_first_generation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.max_generations = 100;
    config.max_time = Duration::ZERO;

    let outcome = GeneticSearch::new(config, FnOracle::new(int_value), PlaceholderVariator)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.stop_reason, StopReason::MaxTime);
    assert_eq!(outcome.generations, 1);
    assert_eq!(outcome.evaluations, 4 + 2);
}

#[test]
fn test_cancel_before_run() {
    let dir = tempfile::tempdir().unwrap();
    let search = GeneticSearch::new(
        scenario_config(dir.path()),
        FnOracle::new(int_value),
        PlaceholderVariator,
    )
    .unwrap();
    search.cancel_handle().store(true, Ordering::SeqCst);

    let outcome = search.run().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(outcome.generations, 1);
}

#[test]
fn test_cancel_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.max_generations = 100_000;
    config.max_time = Duration::from_secs(60);

    let oracle = FnOracle::new(|c: &Chromosome| {
        thread::sleep(Duration::from_millis(1));
        int_value(c)
    });
    let search = GeneticSearch::new(config, oracle, PlaceholderVariator).unwrap();
    let handle = search.cancel_handle();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.store(true, Ordering::SeqCst);
    });

    let outcome = search.run().unwrap();
    canceller.join().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert!(outcome.generations < 100_000);
}

#[test]
fn test_evaluation_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.evaluation_timeout = Some(Duration::from_millis(20));

    let oracle = FnOracle::new(|c: &Chromosome| {
        thread::sleep(Duration::from_millis(500));
        int_value(c)
    });
    let result = GeneticSearch::new(config, oracle, PlaceholderVariator)
        .unwrap()
        .run();
    assert!(matches!(result, Err(SearchError::EvaluationTimeout { .. })));
}

#[test]
fn test_timeout_not_hit() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.evaluation_timeout = Some(Duration::from_secs(5));

    let outcome = GeneticSearch::new(config, FnOracle::new(int_value), PlaceholderVariator)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.evaluations, 6);
}

#[test]
fn test_oracle_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let oracle = FnOracle::new(move |_: &Chromosome| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(SearchError::Oracle("simulation crashed".to_string()))
    });

    let result = GeneticSearch::new(scenario_config(dir.path()), oracle, PlaceholderVariator)
        .unwrap()
        .run();
    assert!(matches!(result, Err(SearchError::Oracle(_))));
    assert!(calls.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_membership_dedup_is_opt_in() {
    let two_genes = |dir: &Path, policy: DedupPolicy| {
        let config = SearchConfig::builder()
            .mu(30)
            .lambda(1)
            .max_generations(1)
            .seed(3)
            .optimal_fitness(-1.0)
            .dedup(policy)
            .parameter(ParameterSpec::int("a", 0, 1))
            .parameter(ParameterSpec::int("b", 0, 1))
            .output_dir(dir)
            .build()
            .unwrap();
        GeneticSearch::new(config, FnOracle::new(|_: &Chromosome| Ok(0.0)), PlaceholderVariator)
            .unwrap()
            .run()
            .unwrap()
            .optimal_solutions
    };

    let exact_dir = tempfile::tempdir().unwrap();
    let exact = two_genes(exact_dir.path(), DedupPolicy::Exact);
    let membership_dir = tempfile::tempdir().unwrap();
    let membership = two_genes(membership_dir.path(), DedupPolicy::Membership);

    // Exact keeps one entry per distinct vector.
    for (i, a) in exact.iter().enumerate() {
        for b in &exact[i + 1..] {
            assert!(!a.chromosome.same_genes(&b.chromosome));
        }
    }
    assert!(membership.len() <= exact.len());
}
