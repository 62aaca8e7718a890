//! Command-line interface

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::artifacts::persist_outcome;
use crate::data::{read_csv_path, DatasetSummary};
use crate::pipeline::ModelSelection;
use crate::server::{run_server, ServerConfig};

#[derive(Parser)]
#[command(name = "tabclass")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated model selection for tabular classification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run model selection on a CSV file
    Train {
        /// Path to the CSV dataset
        #[arg(long)]
        data: PathBuf,
        /// Name of the target column
        #[arg(long)]
        target: String,
        /// Persist the winning model and predictions here
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show dataset shape and schema
    Info {
        #[arg(long)]
        data: PathBuf,
    },
}

fn dim(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(48)));
}

fn kv(key: &str, value: &str) {
    println!("  {} {}", dim(&format!("{:<18}", key)), value.white());
}

pub async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    let config = ServerConfig {
        host: host.to_string(),
        port,
        ..Default::default()
    };
    run_server(config).await
}

pub fn cmd_train(data: &Path, target: &str, output_dir: Option<&Path>) -> anyhow::Result<()> {
    let df = read_csv_path(data)?;
    let selection = ModelSelection::new(df, target)?;
    let outcome = selection.run()?;

    section("Model selection");
    kv("problem type", outcome.problem_type.as_str());
    kv("best model", &outcome.best_model);
    kv("accuracy", &format!("{:.4}", outcome.accuracy));

    section("Candidates");
    for candidate in &outcome.candidates {
        kv(
            &candidate.model,
            &format!(
                "cv {:.4}  holdout {:.4}",
                candidate.cv_accuracy, candidate.holdout_accuracy
            ),
        );
    }

    if let Some(importance) = &outcome.feature_importance {
        section("Top features");
        for fi in importance {
            kv(&fi.feature, &format!("{:+.4}", fi.importance));
        }
    }

    if let Some(dir) = output_dir {
        let job_id = Uuid::new_v4().to_string();
        let paths = persist_outcome(dir, &job_id, &outcome)?;
        section("Artifacts");
        kv("model", &paths.model.display().to_string());
        kv("predictions", &paths.predictions.display().to_string());
    }

    Ok(())
}

pub fn cmd_info(data: &Path) -> anyhow::Result<()> {
    let df = read_csv_path(data)?;
    let summary = DatasetSummary::from_frame(&df);

    section("Dataset");
    kv("rows", &summary.rows.to_string());
    kv("columns", &summary.columns.to_string());

    section("Schema");
    for (name, dtype) in summary.column_names.iter().zip(summary.dtypes.iter()) {
        kv(name, dtype);
    }

    Ok(())
}
