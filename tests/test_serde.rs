#![cfg(feature = "serde")]

use std::time::Duration;

use simsearch::{
    chromosome::ParameterSpec,
    search::SearchConfig,
    stats::Statistic,
    tracker::DedupPolicy,
};

#[test]
fn test_config_round_trips_through_json() {
    let config = SearchConfig::builder()
        .mu(8)
        .lambda(3)
        .max_time(Duration::from_secs(30))
        .parameter(ParameterSpec::int("PREY_POPULATION_TO_GENERATE", 0, 1000))
        .parameter(ParameterSpec::float("PREY_REPRODUCTION_CHANCE", 0.0, 0.25))
        .logged_stats(vec![Statistic::Max])
        .dedup(DedupPolicy::Epsilon(0.01))
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    let back: SearchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_partial_config_uses_defaults() {
    let json = r#"{ "mu": 10, "lambda": 5, "logged_stats": ["mean", "max"] }"#;
    let config: SearchConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.mu, 10);
    assert_eq!(config.lambda, 5);
    assert_eq!(config.max_generations, 5);
    assert_eq!(config.logged_stats, vec![Statistic::Mean, Statistic::Max]);
    assert!(config.validate().is_ok());
}
