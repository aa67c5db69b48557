//! Fleet charging simulator entry point.

use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use fleetsim::config::ScenarioConfig;
use fleetsim::io::export::{ExportFormat, export_results};
use fleetsim::runner::run_scenario;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    export_dir: Option<PathBuf>,
    format: ExportFormat,
    quiet: bool,
}

fn print_help() {
    eprintln!("fleetsim — EV fleet electricity-procurement simulator (DAM vs. DAM+IDM)");
    eprintln!();
    eprintln!("Usage: fleetsim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>     Load scenario from TOML config file");
    eprintln!("  --preset <name>       Use a built-in preset (default, single_day, large_fleet)");
    eprintln!("  --seed <u64>          Override random seed");
    eprintln!("  --export-dir <path>   Write baseline_results and optimized_results tables");
    eprintln!("  --format <csv|json>   Export format (default: csv)");
    eprintln!("  --quiet               Only log errors");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the default scenario is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        export_dir: None,
        format: ExportFormat::Csv,
        quiet: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--export-dir" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --export-dir requires a path argument");
                    process::exit(1);
                }
                cli.export_dir = Some(PathBuf::from(&args[i]));
            }
            "--format" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --format requires csv or json");
                    process::exit(1);
                }
                match ExportFormat::parse(&args[i]) {
                    Some(f) => cli.format = f,
                    None => {
                        eprintln!("error: --format value \"{}\" is not csv or json", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--quiet" => {
                cli.quiet = true;
            }
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

fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();
    init_tracing(cli.quiet);

    // Load config: --scenario takes priority, then --preset, then the default.
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

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let result = match run_scenario(&scenario) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    println!("{}", result.summary);

    if let Some(ref dir) = cli.export_dir {
        match export_results(dir, cli.format, &result.optimized.rows, &result.baseline.rows) {
            Ok((baseline_path, optimized_path)) => {
                eprintln!(
                    "Results written to {} and {}",
                    baseline_path.display(),
                    optimized_path.display()
                );
            }
            Err(e) => {
                eprintln!("error: failed to write results: {e}");
                process::exit(1);
            }
        }
    }
}
