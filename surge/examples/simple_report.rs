//! Simple report example: load a project snapshot and print its budget.

use surge::prelude::*;
use std::path::Path;

fn main() -> Result<(), SurgeError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/two_mode_project.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_report [path/to/project.json]");
        std::process::exit(1);
    }

    let report = SurgeCore::report_file(path, BudgetOptions::default())?;

    println!(
        "Power budget for: {}",
        report.model_name.as_deref().unwrap_or("untitled")
    );
    for mode in &report.summary.modes {
        println!(
            "  {:<16} {:>8.2} W  {:>6.2} h  {:>8.2} Wh",
            mode.name, mode.power_w, mode.duration_h, mode.energy_wh
        );
    }
    println!("  Total energy: {:.2} Wh", report.summary.total_energy_wh);

    match report.battery {
        BatterySizing::Sized {
            capacity_ah,
            capacity_wh,
            bus_voltage_v,
            ..
        } => println!(
            "  Battery: {:.2} Ah at {}V ({:.2} Wh)",
            capacity_ah, bus_voltage_v, capacity_wh
        ),
        BatterySizing::InvalidParameters => {
            println!("  Battery: invalid parameters");
            std::process::exit(1);
        }
    }
    Ok(())
}
