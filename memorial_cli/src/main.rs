//! # Memorial CLI Application
//!
//! Command line front end for motor circuit dimensioning and technical
//! memorial files.
//!
//! ```text
//! memorial dimension 10 7.5
//! memorial summary 10 10 25 --json
//! memorial new obra.mdt --title "Projeto Campo Forte" [--force]
//! memorial add-motor obra.mdt --cv 15
//! memorial conclude obra.mdt
//! memorial pdf obra.mdt -o obra.pdf
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use memorial_core::calculations::{dimension, summarize, DimensioningResult, ProjectSummary};
use memorial_core::catalog::{self, format_cv};
use memorial_core::conclusion::OfflineGenerator;
use memorial_core::file_io::{create_memorial, load_memorial, load_policy, save_memorial, FileLock};
use memorial_core::memorial::{BlockKind, ComparisonData, Memorial};
use memorial_core::pdf::render_memorial_pdf;
use memorial_core::policy::DimensioningPolicy;
use memorial_core::{CalcError, CalcResult};

#[derive(Parser, Debug)]
#[command(name = "memorial")]
#[command(about = "Motor circuit dimensioning and technical memorial generator")]
#[command(version)]
struct Cli {
    /// JSON file overriding the default dimensioning policy
    #[arg(long, value_name = "FILE", global = true)]
    policy: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the motor catalog
    Catalog,
    /// Dimension the circuit of each given motor rating (cv)
    Dimension {
        #[arg(required = true)]
        cv: Vec<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Project totals for a list of motor ratings (cv)
    Summary {
        #[arg(required = true)]
        cv: Vec<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Create a new memorial file
    New {
        file: PathBuf,
        #[arg(long)]
        title: String,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Add a comparison block projecting a catalog motor
    AddMotor {
        file: PathBuf,
        #[arg(long)]
        cv: f64,
        /// 1-based page number (defaults to the last page)
        #[arg(long)]
        page: Option<usize>,
    },
    /// Show a memorial and its project summary
    Show {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Append the technical conclusion and summary table
    Conclude { file: PathBuf },
    /// Export a memorial to PDF
    Pdf {
        file: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Err(err) = run(&cli) {
        if let Some(calc_err) = err.downcast_ref::<CalcError>() {
            if let Ok(json) = serde_json::to_string_pretty(calc_err) {
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
        }
        return Err(err);
    }
    Ok(())
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let policy_override = match &cli.policy {
        Some(path) => Some(load_policy(path)?),
        None => None,
    };
    let policy = policy_override.clone().unwrap_or_default();

    match &cli.command {
        Command::Catalog => print_catalog(),
        Command::Dimension { cv, json } => {
            let results = cv
                .iter()
                .map(|&cv| catalog::require(cv).map(|motor| dimension(motor, &policy)))
                .collect::<CalcResult<Vec<_>>>()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                results.iter().for_each(print_dimensioning);
            }
        }
        Command::Summary { cv, json } => {
            let motors = catalog::resolve_all(cv.iter().copied());
            let summary = summarize(&motors, &policy);
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Command::New { file, title, force } => {
            let mut memorial = Memorial::new(title.as_str());
            memorial.settings.policy = policy;
            create_memorial(&memorial, file, *force, current_user())?;
            println!("Created {}", file.display());
        }
        Command::AddMotor { file, cv, page } => {
            let motor = catalog::require(*cv)?;
            edit_memorial(file, policy_override, |memorial| {
                let target = match page {
                    Some(number) => Some(
                        number
                            .checked_sub(1)
                            .and_then(|index| memorial.pages.get(index))
                            .map(|p| p.id)
                            .ok_or_else(|| CalcError::page_not_found(number))?,
                    ),
                    None => None,
                };
                memorial.add_block(
                    BlockKind::Comparison(ComparisonData::projecting(motor.cv)),
                    target,
                )?;
                Ok(())
            })?;
            println!("Added {} CV to {}", format_cv(motor.cv), file.display());
        }
        Command::Show { file, json } => {
            let memorial = open_memorial(file, policy_override)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&memorial.summary())?);
            } else {
                print_memorial(&memorial);
            }
        }
        Command::Conclude { file } => {
            let outcome = edit_memorial(file, policy_override, |memorial| {
                memorial.append_conclusion(&OfflineGenerator)
            })?;
            match &outcome.generation_error {
                Some(err) => println!(
                    "Summary table appended to {} (no conclusion text: {})",
                    file.display(),
                    err
                ),
                None => println!("Conclusion appended to {}", file.display()),
            }
        }
        Command::Pdf { file, output } => {
            let memorial = open_memorial(file, policy_override)?;
            let output = output.clone().unwrap_or_else(|| file.with_extension("pdf"));
            let pdf_bytes = render_memorial_pdf(&memorial)?;
            std::fs::write(&output, pdf_bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote {}", output.display());
        }
    }
    Ok(())
}

fn open_memorial(path: &Path, policy: Option<DimensioningPolicy>) -> CalcResult<Memorial> {
    let mut memorial = load_memorial(path)?;
    if let Some(policy) = policy {
        memorial.settings.policy = policy;
    }
    Ok(memorial)
}

/// Load, edit and save a memorial while holding its lock.
fn edit_memorial<T>(
    path: &Path,
    policy: Option<DimensioningPolicy>,
    edit: impl FnOnce(&mut Memorial) -> CalcResult<T>,
) -> CalcResult<T> {
    let _lock = FileLock::acquire(path, current_user())?;
    let mut memorial = open_memorial(path, policy)?;
    let output = edit(&mut memorial)?;
    save_memorial(&memorial, path)?;
    Ok(output)
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "memorial".to_string())
}

fn print_catalog() {
    println!(
        "{:>6}  {:>7}  {:>7}  {:>6}  {:>5}  {:>6}  {:>6}",
        "CV", "kW", "In (A)", "η (%)", "FP", "Frame", "RPM"
    );
    for motor in catalog::all() {
        println!(
            "{:>6}  {:>7.2}  {:>7.1}  {:>6.1}  {:>5.2}  {:>6}  {:>6}",
            format_cv(motor.cv),
            motor.kw,
            motor.current_in_a,
            motor.efficiency_pct,
            motor.power_factor,
            motor.frame,
            motor.rpm
        );
    }
}

fn print_dimensioning(result: &DimensioningResult) {
    let motor = &result.motor;
    println!("═══════════════════════════════════════");
    println!("  {} CV ({} kW) - {}", format_cv(motor.cv), motor.kw, motor.model);
    println!("═══════════════════════════════════════");
    println!(
        "  In: {:.1} A | Carcaça: {} | η: {:.1}% | FP: {:.2}",
        motor.current_in_a, motor.frame, motor.efficiency_pct, motor.power_factor
    );
    println!(
        "  Cabo:       {} ({:.0} A, requer {:.1} A){}",
        result.cable_size(),
        result.cable.ampacity_a,
        result.cable.required_ampacity_a,
        if result.cable.table_exhausted { " [TABELA ESGOTADA]" } else { "" }
    );
    println!(
        "  Disjuntor:  {} ({})",
        result.circuit_breaker(),
        result.breaker.family.display_name()
    );
    println!("  Contator:   {}", result.contactor);
    println!(
        "  Partida:    {}",
        result
            .starter_label()
            .unwrap_or_else(|| result.starting_method().display_name().to_string())
    );
    println!("  Proteção:   {}", result.protection_type);
    println!();
}

fn print_summary(summary: &ProjectSummary) {
    println!("═══════════════════════════════════════");
    println!("  RESUMO DO PROJETO");
    println!("═══════════════════════════════════════");
    for entry in &summary.motor_list {
        println!("  {} x {} CV", entry.count, format_cv(entry.cv));
    }
    println!();
    println!("  Motores:       {}", summary.motor_count);
    println!(
        "  Potência:      {} CV ({:.2} kW)",
        format_cv(summary.total_cv),
        summary.total_kw
    );
    println!("  In total:      {:.1} A", summary.total_in_a);
    println!("  Ip estimada:   {:.1} A", summary.total_ip_a);
    println!("  Soft-starters: {}", summary.soft_starter_count);
    println!("  Inversores:    {}", summary.inverter_count);
    println!("═══════════════════════════════════════");
    println!("  {}", summary.recommended_main_breaker);
    println!("═══════════════════════════════════════");
}

fn print_memorial(memorial: &Memorial) {
    println!("{}", memorial.meta.title);
    println!(
        "  versão {} | modificado {}{}",
        memorial.meta.version,
        memorial.meta.modified.format("%Y-%m-%d %H:%M"),
        if memorial.locked { " | BLOQUEADO" } else { "" }
    );
    for (index, page) in memorial.pages.iter().enumerate() {
        println!();
        println!("Página {}", index + 1);
        for block in &page.blocks {
            match &block.kind {
                BlockKind::Text(text) if text.trim().is_empty() => {}
                BlockKind::Text(text) => println!("  {}", text),
                BlockKind::Comparison(data) => println!(
                    "  [ANT {} CV | {} | {} | {}] -> [PROJ {} CV]",
                    format_cv(data.before.cv),
                    data.before.cable,
                    data.before.breaker,
                    data.before.starter,
                    format_cv(data.after.cv)
                ),
                BlockKind::SummaryTable => println!("  [quadro resumo]"),
            }
        }
    }
    println!();
    print_summary(&memorial.summary());
}
