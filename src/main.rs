//! solar-twin entry point: CLI wiring around the library.

mod cli;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use solar_twin::config::TwinConfig;
use solar_twin::io::export::export_sweep_csv;
use solar_twin::pipeline::{Stage, run_pipeline, run_stage};
use solar_twin::record::{CsvRecordStore, Record, RecordStore};
use solar_twin::report::{BaseTotals, DispatchReport, RecordTable};
use solar_twin::synth;

use cli::{Cli, Command, StageArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays clean for reports.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<TwinConfig> {
    let config = match (&cli.config, &cli.preset) {
        (Some(path), _) => TwinConfig::from_toml_file(path)?,
        (None, Some(name)) => TwinConfig::from_preset(name)?,
        (None, None) => TwinConfig::baseline(),
    };
    Ok(config)
}

fn ensure_valid(config: &TwinConfig) -> anyhow::Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    for e in &errors {
        eprintln!("{e}");
    }
    bail!("{} invalid configuration field(s)", errors.len());
}

fn load_records(config: &TwinConfig) -> anyhow::Result<Vec<Record>> {
    let store = CsvRecordStore::new(&config.data.path);
    let records = store
        .load_records()
        .with_context(|| format!("loading records from \"{}\"", config.data.path.display()))?;
    tracing::info!(records = records.len(), path = %config.data.path.display(), "records loaded");
    Ok(records)
}

fn stage(stage: Stage, args: &StageArgs, mut config: TwinConfig) -> anyhow::Result<()> {
    args.data.apply(&mut config);
    ensure_valid(&config)?;
    let mut store = CsvRecordStore::new(&config.data.path);
    let report = run_stage(&mut store, stage, &config)?;
    println!("{report}");
    print_rows(&store, args.rows)
}

fn print_rows(store: &CsvRecordStore, rows: usize) -> anyhow::Result<()> {
    if rows > 0 {
        let records = store.load_records()?;
        println!("\n{}", RecordTable::head(&records, rows));
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Generate(args) => {
            if let Some(days) = args.days {
                config.synth.days = days;
            }
            if let Some(seed) = args.seed {
                config.synth.seed = seed;
            }
            ensure_valid(&config)?;
            let out = args.out.unwrap_or_else(|| config.data.path.clone());
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating \"{}\"", parent.display()))?;
            }
            let records = synth::generate(&config.synth)?;
            CsvRecordStore::new(&out).save_records(&records)?;
            println!("Wrote {} records to {}", records.len(), out.display());
        }
        Command::Forecast(args) => stage(Stage::Forecast, &args, config)?,
        Command::Classify(args) => stage(Stage::Classify, &args, config)?,
        Command::Decide(args) => stage(Stage::Decide, &args, config)?,
        Command::Pipeline(args) => {
            args.data.apply(&mut config);
            ensure_valid(&config)?;
            let mut store = CsvRecordStore::new(&config.data.path);
            let report = run_pipeline(&mut store, &config)?;
            println!("{report}");
            print_rows(&store, args.rows)?;
        }
        Command::Simulate(args) => {
            args.data.apply(&mut config);
            args.sliders.apply(&mut config);
            ensure_valid(&config)?;
            let records = load_records(&config)?;
            let base = BaseTotals::from_records(&records, config.data.hours_per_record);
            let outcome = config.what_if().evaluate(&base.energy_totals()?)?;
            println!(
                "{}",
                DispatchReport::new(base, outcome, config.impact.emission_factor_kg_per_kwh)
            );
        }
        Command::Sweep(args) => {
            args.data.apply(&mut config);
            args.sliders.apply(&mut config);
            ensure_valid(&config)?;
            let records = load_records(&config)?;
            let base = BaseTotals::from_records(&records, config.data.hours_per_record);
            let points = config.what_if().sweep_panel_increase(
                &base.energy_totals()?,
                args.max_panel_pct,
                args.step_pct,
            )?;
            export_sweep_csv(&points, &args.out)?;
            println!("Wrote {} sweep rows to {}", points.len(), args.out.display());
        }
        #[cfg(feature = "tui")]
        Command::Tui(args) => {
            args.data.apply(&mut config);
            args.sliders.apply(&mut config);
            ensure_valid(&config)?;
            let records = load_records(&config)?;
            let app = solar_twin::tui::App::new(&records, &config)?;
            solar_twin::tui::run(app).context("terminal UI failed")?;
        }
        #[cfg(feature = "api")]
        Command::Serve(args) => {
            args.data.apply(&mut config);
            ensure_valid(&config)?;
            let records = load_records(&config)?;
            let state = solar_twin::api::AppState::new(records, &config)?;
            let addr = std::net::SocketAddr::new(args.host, args.port);
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            runtime
                .block_on(solar_twin::api::serve(std::sync::Arc::new(state), addr))
                .with_context(|| format!("serving on {addr}"))?;
        }
    }

    Ok(())
}
