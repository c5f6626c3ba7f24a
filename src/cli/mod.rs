//! Property estimator CLI
//!
//! Command-line interface for training an artifact, batch prediction from a
//! CSV file, and running the prediction service.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data;
use crate::export::ModelArtifact;
use crate::pipeline::{FittedPipeline, PricePipeline};
use crate::training::{MaxFeatures, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
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
#[command(name = "property-estimator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Property price estimation: train, predict, serve")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the pipeline on a CSV file and write the model artifact
    Train {
        /// Training CSV with location, size_sqft, bedrooms, bathrooms, amenities, price
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact destination
        #[arg(short, long, default_value = "model/model.bin")]
        output: PathBuf,

        /// Number of trees
        #[arg(long, default_value = "100")]
        n_estimators: usize,

        /// Base random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Maximum tree depth (unlimited when omitted)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Features considered per split (sqrt, log2, all, a count, or a fraction)
        #[arg(long, default_value = "all")]
        max_features: String,
    },

    /// Predict prices for every row of a CSV file
    Predict {
        /// Model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// CSV with the five feature columns
        #[arg(short, long)]
        data: PathBuf,

        /// Write the input rows plus a predicted_price column here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the prediction service
    Serve {
        /// Server port (defaults to API_PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Model artifact (defaults to MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Prediction log (defaults to PREDICTIONS_PATH)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    output: &Path,
    config: TrainingConfig,
) -> anyhow::Result<FittedPipeline> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = data::load_csv(data_path)?;
    let set = data::training_set_from_frame(&df)?;
    step_done(&format!("{} rows in {:?}", set.len(), start.elapsed()));

    step_run(&format!(
        "Fitting {} trees (seed {})",
        config.n_estimators.to_string().cyan(),
        config.random_state
    ));
    let start = Instant::now();
    let fitted = PricePipeline::new(config).fit(&set)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output.display()));
    let metadata = fitted.save(output)?;
    step_done(&format!("{} features", metadata.feature_names.len()));

    let metrics = fitted.training_metrics();
    println!();
    println!("  {:<16} {}", muted("R² (train)"), format!("{:.4}", metrics.r2).white().bold());
    println!("  {:<16} {}", muted("RMSE (train)"), format!("{:.2}", metrics.rmse).white());
    println!("  {:<16} {}", muted("MAE (train)"), format!("{:.2}", metrics.mae).white());

    let ranked = fitted.feature_importances();
    if !ranked.is_empty() {
        section("Top features");
        for (name, importance) in ranked.iter().take(5) {
            println!("  {:<32} {}", muted(name), format!("{:.4}", importance).white());
        }
    }
    println!();

    Ok(fitted)
}

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let artifact = ModelArtifact::read(model_path)?;
    step_done(&format!(
        "trained {} on {} rows",
        artifact.metadata.created_at.format("%Y-%m-%d %H:%M"),
        artifact.metadata.n_training_rows
    ));

    step_run("Loading data");
    let mut df = data::load_csv(data_path)?;
    step_done(&format!("{} rows", df.height()));

    step_run("Predicting");
    let start = Instant::now();
    let prices = artifact.pipeline.predict_frame(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    df.with_column(Series::new("predicted_price".into(), prices.to_vec()))?;

    match output {
        Some(path) => {
            step_run(&format!("Saving → {}", path.display()));
            let mut file = std::fs::File::create(path)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
            step_done(&format!("{} rows", df.height()));
        }
        None => {
            println!();
            println!("{}", df);
        }
    }

    println!();
    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
    store: Option<PathBuf>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(model) = model {
        config.model_path = model;
    }
    if let Some(store) = store {
        config.predictions_path = store;
    }

    let base = format!("http://{}:{}", config.host, config.port);
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Property Estimator".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Form   ", &base));
    line_box(&kv("API    ", &format!("{}/api/predict", base)));
    line_box(&kv("Health ", &format!("{}/api/health", base)));
    line_box(&kv("Model  ", &config.model_path.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

/// Build a training configuration from `train` arguments
pub fn training_config(
    n_estimators: usize,
    seed: u64,
    max_depth: Option<usize>,
    max_features: &str,
) -> anyhow::Result<TrainingConfig> {
    let config = TrainingConfig::new()
        .with_n_estimators(n_estimators)
        .with_random_state(seed)
        .with_max_depth(max_depth)
        .with_max_features(max_features.parse::<MaxFeatures>()?);
    config.validate()?;
    Ok(config)
}
