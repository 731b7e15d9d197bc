use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use semmed_config::SemmedConfig;
use semmed_io::{JsonLinesSink, PredicationReader, ReadStats};
use semmed_pipeline::{build_oracle, PipelineMetrics, PredicationPipeline, ReferenceData};
use std::time::Duration;
use tracing::info;

use crate::cli::BuildArgs;

/// Fold command line options into the loaded configuration
pub fn apply_overrides(config: &mut SemmedConfig, args: &BuildArgs) {
    if let Some(input) = &args.input {
        config.sources.predications = Some(input.clone());
    }
    if let Some(output) = &args.output {
        config.output.path = Some(output.clone());
    }
    if let Some(url) = &args.oracle_url {
        config.oracle.url = url.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.oracle.batch_size = batch_size;
    }
    if let Some(max_concurrent) = args.max_concurrent {
        config.oracle.max_concurrent = max_concurrent;
    }
    if let Some(cache) = &args.oracle_cache {
        config.oracle.cache_path = Some(cache.clone());
    }
    if let Some(policy) = args.mixed_fields {
        config.expansion.mixed_fields = policy;
    }
    if args.no_collapse {
        config.oracle.enabled = false;
    }
}

/// Execute build command
pub async fn execute(mut config: SemmedConfig, args: BuildArgs) -> Result<PipelineMetrics> {
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    let input = config
        .sources
        .predications
        .clone()
        .context("No predication table configured (set sources.predications or pass --input)")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner.set_message("Loading reference tables");
    let reference = ReferenceData::load(&config.sources)?;

    spinner.set_message(format!("Reading {}", input.display()));
    let reader = PredicationReader::from_config(&config.sources)?;
    let (rows, read_stats) = reader
        .read_path(&input)
        .with_context(|| format!("Failed to read predications from '{}'", input.display()))?;
    info!("Read {} rows from {}", read_stats.rows, input.display());

    let oracle = build_oracle(&config.oracle)?;
    let pipeline = PredicationPipeline::from_config(reference, oracle, &config)?;

    spinner.set_message("Normalizing predications");
    let metrics = match &config.output.path {
        Some(path) => {
            let sink = JsonLinesSink::create(path)
                .await
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
            pipeline.run_into_sink(rows, &sink).await?
        }
        None => pipeline.run_into_sink(rows, &JsonLinesSink::stdout()).await?,
    };
    spinner.finish_and_clear();

    print_summary(&read_stats, &metrics, &config);
    Ok(metrics)
}

// Goes to stderr; stdout may be carrying the documents.
fn print_summary(read: &ReadStats, metrics: &PipelineMetrics, config: &SemmedConfig) {
    eprintln!("\nBuild complete:");
    eprintln!("  Rows read:            {} ({} skipped)", read.rows, read.skipped);
    eprintln!(
        "  Rows kept:            {} ({} zero novelty, {} malformed object)",
        metrics.filter.kept, metrics.filter.zero_novelty, metrics.filter.malformed_object_id
    );
    eprintln!("  Atomic records:       {}", metrics.expand.records);
    eprintln!(
        "  Retired identifiers:  {} records affected, {} dropped",
        metrics.resolve.affected, metrics.resolve.dropped
    );
    if let Some(collapse) = &metrics.collapse {
        eprintln!(
            "  Equivalences:         {} of {} queried, {} records collapsed",
            collapse.equivalences, collapse.queried, collapse.collapsed
        );
    }
    eprintln!(
        "  Documents:            {} ({} with several evidences)",
        metrics.documents(),
        metrics.group.multi_evidence
    );
    match &config.output.path {
        Some(path) => eprintln!("  Output:               {}", path.display()),
        None => eprintln!("  Output:               stdout"),
    }
    eprintln!("  Time:                 {}ms", metrics.total_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use semmed_config::MixedFieldPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = SemmedConfig::default();
        let args = BuildArgs {
            input: Some(PathBuf::from("in.csv")),
            output: Some(PathBuf::from("out.jsonl")),
            batch_size: Some(50),
            mixed_fields: Some(MixedFieldPolicy::FirstConcept),
            no_collapse: true,
            ..BuildArgs::default()
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.sources.predications, Some(PathBuf::from("in.csv")));
        assert_eq!(config.output.path, Some(PathBuf::from("out.jsonl")));
        assert_eq!(config.oracle.batch_size, 50);
        assert_eq!(config.expansion.mixed_fields, MixedFieldPolicy::FirstConcept);
        assert!(!config.oracle.enabled);
    }

    #[test]
    fn test_absent_overrides_keep_config() {
        let mut config = SemmedConfig::default();
        let before = config.oracle.url.clone();

        apply_overrides(&mut config, &BuildArgs::default());

        assert_eq!(config.oracle.url, before);
        assert!(config.oracle.enabled);
        assert!(config.sources.predications.is_none());
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        let args = BuildArgs {
            no_collapse: true,
            ..BuildArgs::default()
        };

        let err = execute(SemmedConfig::default(), args).await.unwrap_err();

        assert!(err.to_string().contains("--input"));
    }
}
