//! SURGE CLI - spacecraft power budget reports from the command line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use surge::{
    BatteryParameters, BatterySizing, BudgetOptions, BudgetReport, EnergyBasis, ProjectSnapshot,
    SurgeCore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "surge")]
#[command(about = "Spacecraft power budget calculator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-mode power, energy totals and battery sizing for a project file
    Report {
        /// Path to an exported project .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Battery sizing only
    Battery {
        /// Path to an exported project .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Check that a project file can be imported
    Check {
        /// Path to an exported project .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Args)]
struct BudgetArgs {
    /// Energy figure used for battery sizing
    #[arg(long, value_enum, default_value = "literal")]
    energy_basis: EnergyBasisArg,

    /// Depth of discharge in percent (overrides the file)
    #[arg(long)]
    dod: Option<f64>,

    /// Conversion efficiency in percent (overrides the file)
    #[arg(long)]
    efficiency: Option<f64>,

    /// Bus voltage in volts (overrides the file)
    #[arg(long)]
    bus_voltage: Option<f64>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, ValueEnum)]
enum EnergyBasisArg {
    /// Total power of all modes times total duration
    Literal,
    /// Sum of each mode's power times its own duration
    DutyCycle,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Report {
            file,
            format,
            budget,
        } => handle_report(&file, format, &budget),
        Commands::Battery {
            file,
            format,
            budget,
        } => handle_battery(&file, format, &budget),
        Commands::Check { file } => handle_check(&file),
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SURGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Overrides are applied on top of the parameters stored in the file.
fn budget_options(snapshot: &ProjectSnapshot, args: &BudgetArgs) -> BudgetOptions {
    let energy_basis = match args.energy_basis {
        EnergyBasisArg::Literal => EnergyBasis::Literal,
        EnergyBasisArg::DutyCycle => EnergyBasis::DutyCycle,
    };

    let battery = if args.dod.is_some() || args.efficiency.is_some() || args.bus_voltage.is_some() {
        let stored = snapshot.battery_parameters();
        Some(BatteryParameters {
            depth_of_discharge_pct: args.dod.unwrap_or(stored.depth_of_discharge_pct),
            efficiency_pct: args.efficiency.unwrap_or(stored.efficiency_pct),
            bus_voltage_v: args.bus_voltage.unwrap_or(stored.bus_voltage_v),
        })
    } else {
        None
    };

    BudgetOptions {
        energy_basis,
        battery,
    }
}

fn load_snapshot(file: &Path) -> Result<ProjectSnapshot, surge::SurgeError> {
    let text = std::fs::read_to_string(file)?;
    ProjectSnapshot::from_json(&text)
}

fn load_report(file: &Path, args: &BudgetArgs) -> Result<BudgetReport, surge::SurgeError> {
    let snapshot = load_snapshot(file)?;
    let options = budget_options(&snapshot, args);
    SurgeCore::report(&snapshot, options)
}

fn handle_report(file: &Path, format: OutputFormat, args: &BudgetArgs) -> i32 {
    match load_report(file, args) {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_human(&report),
                OutputFormat::Json => output_json(&report),
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_battery(file: &Path, format: OutputFormat, args: &BudgetArgs) -> i32 {
    match load_report(file, args) {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_battery_human(&report),
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "parameters": report.parameters,
                        "energyBasis": report.energy_basis,
                        "battery": report.battery,
                        "analysis": report.analysis,
                    });
                    print_json(&output);
                }
            }
            if report.battery_is_valid() {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_check(file: &Path) -> i32 {
    let snapshot = match load_snapshot(file) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match SurgeCore::report(&snapshot, BudgetOptions::default()) {
        Ok(report) => {
            println!("OK: {}", file.display());
            println!("  Library components: {}", report.library_count);
            println!("  Model components:   {}", report.component_count);
            println!("  Modes:              {}", report.summary.modes.len());
            if report.dropped_references > 0 {
                println!(
                    "  Dropped {} mode reference(s) to missing components",
                    report.dropped_references
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn output_human(report: &BudgetReport) {
    println!(
        "\nModel: {}",
        report.model_name.as_deref().unwrap_or("untitled")
    );
    println!("{}", "─".repeat(60));

    if report.summary.modes.is_empty() {
        println!("  No modes defined");
    } else {
        println!(
            "  {:<20} {:>10} {:>13} {:>12}",
            "Mode", "Power (W)", "Duration (h)", "Energy (Wh)"
        );
        for mode in &report.summary.modes {
            println!(
                "  {:<20} {:>10.2} {:>13.2} {:>12.2}",
                mode.name, mode.power_w, mode.duration_h, mode.energy_wh
            );
        }
        println!(
            "  {:<20} {:>10.2} {:>13.2} {:>12.2}",
            "Total",
            report.summary.total_power_w,
            report.summary.total_duration_h,
            report.summary.total_energy_wh
        );
    }

    println!(
        "\n  Total Power (All Modes): {:.2} W",
        report.summary.total_power_w
    );
    println!(
        "  Duty-cycle energy:       {:.2} Wh",
        report.summary.cycle_energy_wh
    );
    if report.dropped_references > 0 {
        println!(
            "  Dropped {} mode reference(s) to missing components",
            report.dropped_references
        );
    }

    output_battery_human(report);
}

fn output_battery_human(report: &BudgetReport) {
    println!("\n  Battery Capacity Requirements:");
    match report.battery {
        BatterySizing::Sized {
            energy_wh,
            capacity_ah,
            capacity_wh,
            bus_voltage_v,
        } => {
            println!("    Total Energy per Cycle: {:.2} Wh", energy_wh);
            println!(
                "    Required Capacity: {:.2} Ah at {}V",
                capacity_ah, bus_voltage_v
            );
            println!("    Equivalent: {:.2} Wh", capacity_wh);
        }
        BatterySizing::InvalidParameters => {
            println!("    Invalid battery parameters");
        }
    }
    println!(
        "    Safety margin: {:.1}%",
        report.analysis.margin_pct
    );
}

fn output_json(report: &BudgetReport) {
    let output = serde_json::json!({
        "model": report.model_name,
        "components": report.component_count,
        "summary": report.summary,
        "energyBasis": report.energy_basis,
        "parameters": report.parameters,
        "battery": report.battery,
        "analysis": report.analysis,
        "droppedReferences": report.dropped_references,
    });
    print_json(&output);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
