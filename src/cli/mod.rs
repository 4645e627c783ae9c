//! Command-line interface
//!
//! Thin driver around the cleaning pipeline: load a CSV, clean it, write the
//! cleaned table and the QC summary.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::anomaly::OutlierMethod;
use crate::imputation::ImputeMethod;
use crate::pipeline::CleaningPipeline;
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "purifai")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tabular data cleaning: outlier removal and adaptive imputation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a CSV file and write the result plus a QC summary
    Clean {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV file for the cleaned table
        #[arg(short, long)]
        output: PathBuf,

        /// Output JSON file for the QC summary
        #[arg(long)]
        qc: Option<PathBuf>,

        /// Outlier method (iqr, z-score, isolation-forest)
        #[arg(long, default_value = "iqr")]
        outlier_method: String,

        /// Imputation method (knn, mean, median)
        #[arg(long, default_value = "knn")]
        imputation_method: String,
    },

    /// Show table shape and missing-cell counts
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_clean(
    data_path: &PathBuf,
    output_path: &PathBuf,
    qc_path: Option<&PathBuf>,
    outlier_method: &str,
    imputation_method: &str,
) -> anyhow::Result<()> {
    section("Clean");

    let outlier_method: OutlierMethod = outlier_method.parse()?;
    let imputation_method: ImputeMethod = imputation_method.parse()?;

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::load_csv(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    step_run(&format!(
        "Cleaning ({} / {})",
        outlier_method.to_string().cyan(),
        imputation_method.to_string().cyan()
    ));
    let start = Instant::now();
    let outcome = CleaningPipeline::new(outlier_method, imputation_method).run(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output_path.display()));
    let mut cleaned = outcome.cleaned.clone();
    DataSaver::save_csv(&mut cleaned, output_path)?;
    step_done(&format!("{} rows", cleaned.height()));

    if let Some(qc_path) = qc_path {
        step_run(&format!("QC summary → {}", qc_path.display()));
        DataSaver::save_json(&outcome.summary, qc_path)?;
        step_done("");
    }

    let s = &outcome.summary;
    println!();
    println!("  {:<20} {}", muted("Rows"), s.initial_rows.to_string().white());
    println!(
        "  {:<20} {}",
        muted("Outliers removed"),
        s.outliers_detected.to_string().white()
    );
    println!(
        "  {:<20} {} {} {}",
        muted("Missing cells"),
        s.missing_before.to_string().white(),
        dim("→"),
        s.missing_after.to_string().white()
    );
    println!();

    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Info");

    let df = DataLoader::load_csv(data_path)?;
    println!(
        "  {:<20} {}",
        muted("Shape"),
        format!("{} rows × {} cols", df.height(), df.width()).white()
    );
    println!();

    for col in df.get_columns() {
        let missing = col.null_count();
        let marker = if missing > 0 {
            format!("{missing} missing").yellow()
        } else {
            "complete".truecolor(100, 210, 120)
        };
        println!(
            "  {:<20} {:<10} {}",
            col.name().to_string().white(),
            dim(&col.dtype().to_string()),
            marker
        );
    }
    println!();

    Ok(())
}
