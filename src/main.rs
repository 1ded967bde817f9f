use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use polars::prelude::*;
use searchmi::config::ConfigManager;
use searchmi::engines::search::{self, checkpoint, ConsoleProgressCallback, SearchRunner};
use searchmi::export::ResultExporter;
use searchmi::{EngineKind, FitnessEvaluator, SearchData};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    Genetic,
    Annealing,
}

impl From<Algorithm> for EngineKind {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Genetic => EngineKind::Genetic,
            Algorithm::Annealing => EngineKind::Annealing,
        }
    }
}

/// Search for a minimal species signature separating metadata groups.
#[derive(Debug, Parser)]
#[command(name = "searchmi", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV with one row per sample: species abundances plus the group column
    #[arg(long)]
    input: PathBuf,

    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    #[arg(long)]
    group_column: Option<String>,

    /// Spreadsheet to write the results to
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON checkpoint to resume from and save to
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let manager = ConfigManager::new();
    if let Some(path) = &cli.config {
        manager
            .load_layered(path)
            .with_context(|| format!("loading config {}", path.display()))?;
    }
    manager.update(|c| {
        if let Some(algorithm) = cli.algorithm {
            c.run.algorithm = algorithm.into();
        }
        if let Some(group_column) = &cli.group_column {
            c.run.group_column = group_column.clone();
        }
        if let Some(output) = &cli.output {
            c.run.export_path = Some(output.clone());
        }
        if let Some(checkpoint) = &cli.checkpoint {
            c.run.checkpoint_path = Some(checkpoint.clone());
        }
    })?;
    let config = manager.get();

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(cli.input.clone()))?
        .finish()
        .with_context(|| format!("reading {}", cli.input.display()))?;
    log::info!("Loaded {} samples x {} columns", frame.height(), frame.width());

    let data = SearchData::from_frame(
        &frame,
        &config.run.group_column,
        config.run.index_column.as_deref(),
    )?;
    let evaluator = FitnessEvaluator::from_config(Arc::new(data), &config.objective)?;

    let kind = config.run.algorithm;
    let mut engine = search::build_engine(kind, Arc::new(evaluator), &config)?;

    if let Some(path) = &config.run.checkpoint_path {
        if let Some(saved) = checkpoint::load_checkpoint(path)? {
            log::info!("Resuming from checkpoint saved at {}", saved.saved_at);
            engine.restore(saved)?;
        }
    }

    let runner = SearchRunner::new(search::max_steps(kind, &config));
    let summary = runner.run(engine.as_mut(), &mut ConsoleProgressCallback)?;

    if let Some(path) = &config.run.checkpoint_path {
        checkpoint::save_checkpoint(engine.as_ref(), path)?;
    }
    if let Some(path) = &config.run.export_path {
        ResultExporter::export(engine.as_ref(), path)?;
    }

    println!("Best p-value: {}", summary.best_cost);
    println!("Signature ({} species):", summary.best_features.len());
    for name in &summary.best_features {
        println!("  {}", name);
    }
    Ok(())
}
