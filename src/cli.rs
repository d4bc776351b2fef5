//! Command-line arguments.

#[cfg(feature = "api")]
use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use solar_twin::config::TwinConfig;

#[derive(Debug, Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    /// Load configuration from a TOML file.
    #[arg(long, global = true, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset: baseline, expanded_array or efficiency.
    #[arg(long, global = true)]
    pub preset: Option<String>,

    /// More log output (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a seeded synthetic record set.
    Generate(GenerateArgs),

    /// Fit the solar forecast and store predictions.
    Forecast(StageArgs),

    /// Classify consumption and flag waste periods.
    Classify(StageArgs),

    /// Derive a recommendation for every record.
    Decide(StageArgs),

    /// Run forecast, classify and decide in one pass.
    Pipeline(StageArgs),

    /// Evaluate one battery / scenario what-if.
    Simulate(SimulateArgs),

    /// Evaluate a range of panel increases and write them as CSV.
    Sweep(SweepArgs),

    /// Explore what-ifs interactively.
    #[cfg(feature = "tui")]
    Tui(SimulateArgs),

    /// Serve the REST API.
    #[cfg(feature = "api")]
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct DataArgs {
    /// Record store CSV; overrides `[data] path`.
    #[arg(long, short)]
    pub data: Option<PathBuf>,
}

impl DataArgs {
    pub fn apply(&self, config: &mut TwinConfig) {
        if let Some(path) = &self.data {
            config.data.path.clone_from(path);
        }
    }
}

#[derive(Debug, Args)]
pub struct StageArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Also print the first N annotated records.
    #[arg(long, default_value_t = 0)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output CSV; defaults to `[data] path`.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Number of days to generate.
    #[arg(long)]
    pub days: Option<usize>,

    /// Random seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Slider overrides; omitted values keep the configured ones.
#[derive(Debug, Args)]
pub struct SliderArgs {
    #[arg(long)]
    pub capacity_kwh: Option<f64>,

    #[arg(long)]
    pub min_soc_pct: Option<f64>,

    #[arg(long)]
    pub initial_charge_pct: Option<f64>,

    #[arg(long)]
    pub panel_increase_pct: Option<f64>,

    #[arg(long)]
    pub load_reduction_pct: Option<f64>,
}

impl SliderArgs {
    pub fn apply(&self, config: &mut TwinConfig) {
        let b = &mut config.battery;
        b.capacity_kwh = self.capacity_kwh.unwrap_or(b.capacity_kwh);
        b.min_soc_pct = self.min_soc_pct.unwrap_or(b.min_soc_pct);
        b.initial_charge_pct = self.initial_charge_pct.unwrap_or(b.initial_charge_pct);
        let s = &mut config.scenario;
        s.panel_increase_pct = self.panel_increase_pct.unwrap_or(s.panel_increase_pct);
        s.load_reduction_pct = self.load_reduction_pct.unwrap_or(s.load_reduction_pct);
    }
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub sliders: SliderArgs,
}

#[derive(Debug, Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub sliders: SliderArgs,

    /// Output CSV.
    #[arg(long, short)]
    pub out: PathBuf,

    /// Largest panel increase evaluated (%).
    #[arg(long, default_value_t = 200.0)]
    pub max_panel_pct: f64,

    /// Panel increase step (%).
    #[arg(long, default_value_t = 10.0)]
    pub step_pct: f64,
}

#[cfg(feature = "api")]
#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind.
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}
