use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rota_config::WorkflowDef;
use rota_resolver::build;

mod document;

/// Rota - unrolls cycling workflow templates into concrete task graphs
#[derive(Parser)]
#[command(name = "rota")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Unroll a workflow and report what it expands to
  Verify {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Unroll a workflow and write the instance graph as JSON
  Unroll {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Verify { workflow_file }) => verify(&workflow_file)?,
    Some(Commands::Unroll {
      workflow_file,
      output,
    }) => unroll(&workflow_file, output.as_deref())?,
    None => {
      println!("rota - use --help to see available commands");
    }
  }

  Ok(())
}

fn verify(workflow_file: &Path) -> Result<()> {
  let def = load_workflow(workflow_file)?;
  let workflow = build(&def).context("failed to unroll workflow")?;

  let graph = workflow.graph();
  info!(
    workflow = %workflow.name(),
    task_instances = workflow.tasks().len(),
    data_instances = workflow.data().len(),
    entry_points = graph.entry_points().len(),
    "workflow verified"
  );
  for cycle in &def.cycles {
    let count = workflow
      .tasks()
      .iter()
      .filter(|task| task.cycle == cycle.name)
      .count();
    info!(cycle = %cycle.name, task_instances = count, "cycle unrolled");
  }

  println!(
    "{}: {} task instances, {} data instances",
    workflow.name(),
    workflow.tasks().len(),
    workflow.data().len()
  );
  Ok(())
}

fn unroll(workflow_file: &Path, output: Option<&Path>) -> Result<()> {
  let def = load_workflow(workflow_file)?;
  let workflow = build(&def).context("failed to unroll workflow")?;

  let json = serde_json::to_string_pretty(&document::Unrolled::new(&workflow))
    .context("failed to serialize unrolled workflow")?;

  match output {
    Some(path) => {
      fs::write(path, json)
        .with_context(|| format!("failed to write output file: {}", path.display()))?;
      info!(output = %path.display(), "unrolled workflow written");
    }
    None => println!("{json}"),
  }
  Ok(())
}

/// Read a workflow file. Relative (or missing) root directories are taken
/// relative to the file's directory.
fn load_workflow(workflow_file: &Path) -> Result<WorkflowDef> {
  let content = fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let mut def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  let base = workflow_file.parent().unwrap_or_else(|| Path::new(""));
  if def.rootdir.is_relative() {
    def.rootdir = base.join(&def.rootdir);
  }

  info!(workflow = %def.name, rootdir = %def.rootdir.display(), "loaded workflow");
  Ok(def)
}
