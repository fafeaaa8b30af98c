//! BESS sizing tool entry point — CLI wiring, config load/validate, sweep, reports.

use std::path::Path;
use std::process;

use bess_sizer::config::ScenarioConfig;
use bess_sizer::io::report::{export_hourly_csv, export_summary_csv};
use bess_sizer::io::solar;
use bess_sizer::sim::engine::YearlySimulator;
use bess_sizer::sweep::run_sweep;

/// Parsed CLI arguments.
struct CliArgs {
    solar_path: Option<String>,
    scenario_path: Option<String>,
    preset: Option<String>,
    size_min: Option<f32>,
    size_max: Option<f32>,
    size_step: Option<f32>,
    summary_out: Option<String>,
    hourly_out: Option<String>,
}

fn print_help() {
    eprintln!("bess-sizer — BESS dispatch simulation and sizing sweep");
    eprintln!();
    eprintln!("Usage: bess-sizer --solar <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --solar <path>           Solar profile CSV (required)");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (default)");
    eprintln!("  --size-min <MWh>         Override sweep.size_min");
    eprintln!("  --size-max <MWh>         Override sweep.size_max");
    eprintln!("  --size-step <MWh>        Override sweep.size_step");
    eprintln!("  --summary-out <path>     Write the summary report CSV");
    eprintln!("  --hourly-out <path>      Write the hourly report CSV for the optimal capacity");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the default scenario is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        solar_path: None,
        scenario_path: None,
        preset: None,
        size_min: None,
        size_max: None,
        size_step: None,
        summary_out: None,
        hourly_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        macro_rules! next_arg {
            ($flag:literal) => {{
                i += 1;
                if i >= args.len() {
                    eprintln!("error: {} requires an argument", $flag);
                    process::exit(1);
                }
                args[i].clone()
            }};
        }
        macro_rules! next_f32 {
            ($flag:literal) => {{
                let raw = next_arg!($flag);
                raw.parse::<f32>().unwrap_or_else(|_| {
                    eprintln!("error: {} value \"{raw}\" is not a valid number", $flag);
                    process::exit(1);
                })
            }};
        }

        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--solar" => cli.solar_path = Some(next_arg!("--solar")),
            "--scenario" => cli.scenario_path = Some(next_arg!("--scenario")),
            "--preset" => cli.preset = Some(next_arg!("--preset")),
            "--size-min" => cli.size_min = Some(next_f32!("--size-min")),
            "--size-max" => cli.size_max = Some(next_f32!("--size-max")),
            "--size-step" => cli.size_step = Some(next_f32!("--size-step")),
            "--summary-out" => cli.summary_out = Some(next_arg!("--summary-out")),
            "--hourly-out" => cli.hourly_out = Some(next_arg!("--hourly-out")),
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();

    let Some(ref solar_path) = cli.solar_path else {
        eprintln!("error: --solar is required");
        print_help();
        process::exit(1);
    };

    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::default_scenario()
    };

    if let Some(v) = cli.size_min {
        scenario.sweep.size_min = v;
    }
    if let Some(v) = cli.size_max {
        scenario.sweep.size_max = v;
    }
    if let Some(v) = cli.size_step {
        scenario.sweep.size_step = v;
    }

    let profile = match solar::load_csv(Path::new(solar_path)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let issues = scenario.validate(Some(profile.average_mw()));
    let fatal: Vec<_> = issues.iter().filter(|i| i.is_fatal()).collect();
    if !fatal.is_empty() {
        eprintln!("config validation failed:");
        for issue in &issues {
            eprintln!("  {issue}");
        }
        process::exit(1);
    }
    for issue in issues.iter().filter(|i| !i.is_fatal()) {
        eprintln!("warning: {issue}");
    }

    let result = run_sweep(&scenario.battery, &scenario.delivery, &scenario.sweep, &profile, None);

    for s in &result.summaries {
        println!(
            "capacity={:>6.1} MWh  hours_delivered={:>5}  wastage={:>6.2}%  cycles={:>7.1}  \
             degradation={:>6.4}%  marginal={}",
            s.capacity_mwh,
            s.hours_delivered,
            s.wastage_pct,
            s.total_cycles,
            s.degradation_pct,
            s.marginal_hours_per_mwh.map_or_else(|| "n/a".to_string(), |m| format!("{m:.3}")),
        );
    }

    for (capacity, violation) in &result.invariant_violations {
        eprintln!("error: capacity {capacity:.1} MWh halted on invariant violation: {violation}");
    }

    match result.optimal_capacity_mwh {
        Some(optimal) => println!("\nrecommended capacity: {optimal:.1} MWh"),
        None => println!("\nno capacity completed (sweep cancelled before results were available)"),
    }

    if let Some(ref path) = cli.summary_out {
        if let Err(e) = export_summary_csv(&result.summaries, Path::new(path)) {
            eprintln!("error: failed to write summary CSV: {e}");
            process::exit(1);
        }
        eprintln!("Summary report written to {path}");
    }

    if let Some(ref path) = cli.hourly_out {
        let Some(optimal) = result.optimal_capacity_mwh else {
            eprintln!("error: cannot write hourly report, no capacity completed");
            process::exit(1);
        };
        let mut sim = YearlySimulator::new(optimal, &scenario.battery, scenario.delivery.clone(), &profile);
        let records = match sim.run() {
            Ok(records) => records,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = export_hourly_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write hourly CSV: {e}");
            process::exit(1);
        }
        eprintln!("Hourly report for {optimal:.1} MWh written to {path}");
    }
}
