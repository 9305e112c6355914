//! provflow CLI: run pipelines and inspect saved runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use provflow_core::prelude::*;
use provflow_exec::{Engine, ExecError};
use provflow_graph::dsl::{build_graph, parse_pipeline, BuiltPipeline, PipelineDoc};
use provflow_graph::NodeKind;
use provflow_io::{FsRunStore, UriLoader};
use provflow_operators::Dispatcher;
use tracing_subscriber::EnvFilter;

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "provflow", version = provflow_core::VERSION)]
#[command(about = "Pipeline lineage and provenance engine", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file and save its run
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Neighbour count for nearest-neighbour imputation (overrides config)
        #[arg(long)]
        knn_neighbors: Option<usize>,

        /// Description collaborator timeout in milliseconds (overrides config)
        #[arg(long)]
        describe_timeout_ms: Option<u64>,

        /// Directory for the saved run (overrides config)
        #[arg(long)]
        export_dir: Option<String>,

        /// Directory for JSONL dumps of step outputs (overrides config)
        #[arg(long)]
        emit_dir: Option<String>,

        /// Do not save the run
        #[arg(long)]
        no_save: bool,
    },

    /// Parse a pipeline and check its graph without executing it
    Validate {
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the execution order of a pipeline
    Explain {
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// List saved runs, newest first
    Runs {
        /// Directory holding saved runs (defaults to the configured export dir)
        #[arg(long)]
        dir: Option<String>,
    },

    /// Print a saved run's export document
    Show {
        /// Run id
        id: String,

        #[arg(long)]
        dir: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = match cli.command {
        Commands::Run {
            pipeline,
            knn_neighbors,
            describe_timeout_ms,
            export_dir,
            emit_dir,
            no_save,
        } => {
            let overrides = ConfigOverrides {
                describe_timeout_ms,
                knn_neighbors,
                export_dir,
                emit_dir,
            };
            run_pipeline(&pipeline, &overrides, !no_save)
        }
        Commands::Validate { pipeline } => {
            validate_pipeline(&pipeline).map(|_| println!("✓ Pipeline is valid"))
        }
        Commands::Explain { pipeline } => explain_pipeline(&pipeline),
        Commands::Runs { dir } => list_runs(dir),
        Commands::Show { id, dir } => show_run(&id, dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("PROVFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// defaults < environment < pipeline `config:` < command line.
fn resolve_config(
    base: EngineConfig,
    doc: Option<&ConfigOverrides>,
    cli: &ConfigOverrides,
) -> EngineConfig {
    let mut cfg = base;
    if let Some(doc) = doc {
        cfg.apply(doc);
    }
    cfg.apply(cli);
    cfg
}

fn load_doc(path: &Path) -> CliResult<PipelineDoc> {
    let yaml = fs::read_to_string(path)?;
    Ok(parse_pipeline(&yaml)?)
}

fn build(
    doc: &PipelineDoc,
    cfg: &EngineConfig,
    loader: &dyn SourceLoader,
) -> CliResult<(BuiltPipeline, DatasetRegistry)> {
    let mut registry = DatasetRegistry::new();
    let built = build_graph(doc, loader, &mut registry, &Dispatcher::from_config(cfg))?;
    Ok((built, registry))
}

fn run_pipeline(path: &Path, overrides: &ConfigOverrides, save: bool) -> CliResult<()> {
    let doc = load_doc(path)?;
    let cfg = resolve_config(EngineConfig::from_env(), doc.config.as_ref(), overrides);
    tracing::info!(pipeline = %path.display(), nodes = doc.nodes.len(), "pipeline loaded");
    let loader: Arc<dyn SourceLoader> = Arc::new(UriLoader::new());

    let (mut built, registry) = build(&doc, &cfg, loader.as_ref())?;
    let mut run = PipelineRun::with_registry(registry);
    let engine = Engine::new(cfg.clone(), Arc::clone(&loader));
    let outcome = engine.run(&mut built.graph, &mut run);

    // Completed work is kept even when the run stops early.
    if save {
        let written = FsRunStore::new(&cfg.export_dir).save(&run)?;
        println!("Run saved to {}", written.display());
    }

    match outcome {
        Ok(report) => {
            println!("✓ Pipeline executed successfully");
            println!("  Run id: {}", run.id());
            println!("  Nodes executed: {}", report.executed.len());
            println!("  Steps recorded: {}", run.steps().len());
            for step in run.steps() {
                println!("    - {}", step.description);
            }
            Ok(())
        }
        Err(ExecError::NodeFailed { node, source }) => {
            let name = built
                .graph
                .node(node)
                .map(|n| n.display_name())
                .unwrap_or_else(|| node.to_string());
            Err(format!("step '{name}' failed ({}): {source}", source.kind()).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn validate_pipeline(path: &Path) -> CliResult<BuiltPipeline> {
    let doc = load_doc(path)?;
    let cfg = resolve_config(EngineConfig::from_env(), doc.config.as_ref(), &ConfigOverrides::default());
    let (built, _) = build(&doc, &cfg, &UriLoader::new())?;
    built.graph.validate()?;
    Ok(built)
}

fn explain_pipeline(path: &Path) -> CliResult<()> {
    let built = validate_pipeline(path)?;
    let graph = &built.graph;

    println!("Pipeline Execution Plan");
    println!("=======================");
    println!();
    println!("Nodes: {}  Edges: {}", graph.len(), graph.edges().len());
    println!();
    for (i, generation) in graph.generations().enumerate() {
        println!("Generation {}:", i);
        for id in generation {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let what = match &node.kind {
                NodeKind::Raw { source, .. } => format!("raw {source}"),
                NodeKind::Step { kind, inputs, .. } => {
                    let names: Vec<String> = inputs
                        .iter()
                        .filter_map(|i| graph.node(*i).map(|n| n.display_name()))
                        .collect();
                    format!("{kind} <- [{}]", names.join(", "))
                }
            };
            println!("  {} ({}): {}", node.display_name(), id, what);
            println!("      columns: {}", node.columns().join(", "));
        }
    }
    Ok(())
}

fn store_dir(dir: Option<String>) -> String {
    dir.unwrap_or_else(|| EngineConfig::from_env().export_dir)
}

fn list_runs(dir: Option<String>) -> CliResult<()> {
    let store = FsRunStore::new(store_dir(dir));
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No saved runs in {}", store.root().display());
        return Ok(());
    }
    println!("{:<36}  {:<25}  {:>8}  {:>5}", "RUN ID", "STARTED", "DATASETS", "STEPS");
    for r in runs {
        println!(
            "{:<36}  {:<25}  {:>8}  {:>5}",
            r.run_id,
            r.start_time.to_rfc3339(),
            r.datasets,
            r.steps
        );
    }
    Ok(())
}

fn show_run(id: &str, dir: Option<String>) -> CliResult<()> {
    let id: RunId = id.parse()?;
    let store = FsRunStore::new(store_dir(dir));
    let doc = store.load_document(id)?;
    println!("{}", doc.to_json_pretty()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_config_overrides_env_defaults() {
        let doc = ConfigOverrides {
            knn_neighbors: Some(5),
            export_dir: Some("/tmp/pipeline".into()),
            ..Default::default()
        };
        let cfg = resolve_config(EngineConfig::default(), Some(&doc), &ConfigOverrides::default());
        assert_eq!(cfg.knn_neighbors, 5);
        assert_eq!(cfg.export_dir, "/tmp/pipeline");
        assert_eq!(cfg.describe_timeout_ms, 5_000);
    }

    #[test]
    fn cli_overrides_higher_priority_than_config() {
        let doc = ConfigOverrides {
            export_dir: Some("/tmp/pipeline".into()),
            ..Default::default()
        };
        let cli = ConfigOverrides {
            export_dir: Some("/tmp/cli".into()),
            ..Default::default()
        };
        let cfg = resolve_config(EngineConfig::default(), Some(&doc), &cli);
        assert_eq!(cfg.export_dir, "/tmp/cli");
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "provflow",
            "run",
            "--pipeline",
            "p.yaml",
            "--knn-neighbors",
            "4",
            "--no-save",
            "--log-json",
        ])
        .unwrap();
        assert!(cli.log_json);
        match cli.command {
            Commands::Run {
                knn_neighbors,
                no_save,
                ..
            } => {
                assert_eq!(knn_neighbors, Some(4));
                assert!(no_save);
            }
            _ => panic!("expected run"),
        }
    }
}
