//! ectune - gaming-laptop EC/MSR tuning tool
//!
//! A command-line tool for reading and writing embedded-controller
//! registers, applying power modes, undervolting, and monitoring
//! temperatures.

use clap::Parser;
use ectune::cli::args::{generate_completions, Cli, Commands};
use ectune::commands::{
    run_cpu, run_ec, run_monitor, run_power, run_temps, run_thermal, run_undervolt,
};
use ectune::config::{Config, ConfigBuilder};
use ectune::control::RegisterChannel;
use ectune::error::{AppError, ConfigError, HwError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let result = load_config(&cli).and_then(|config| run(&cli, &config));

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let config = ConfigBuilder::new()
        .with_file(cli.config.as_deref())?
        .with_verbose(cli.verbose.then_some(true))
        .with_dry_run(cli.dry_run.then_some(true))
        .with_driver(cli.driver.map(Into::into))
        .with_synthetic(cli.synthetic.then_some(true))
        .build();
    log::debug!("Driver: {:?}, dry run: {}", config.driver.kind, config.general.dry_run);
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    match &cli.command {
        Commands::Cpu => run_cpu(cli.format),

        Commands::Ec(args) => run_ec(args, config, cli.format),

        Commands::Power(args) => run_power(args, config, cli.format),

        Commands::Undervolt(args) => run_undervolt(args, config, cli.format),

        Commands::Thermal(args) => run_thermal(args, config, cli.format),

        Commands::Monitor(args) => run_monitor(args, config, cli.format),

        Commands::Temps { background } => run_temps(*background, config, cli.format),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Hw(HwError::NotReady) => {
            eprintln!();
            eprintln!("Hint: Try running with sudo or as root.");
            eprintln!("      Load the vendor driver, or use --driver positional with");
            eprintln!("      'modprobe ec_sys write_support=1' and 'modprobe msr'.");
        }
        AppError::Hw(HwError::SafetyViolation { .. } | HwError::BlockedWrite { .. }) => {
            eprintln!();
            let allowed: Vec<String> = RegisterChannel::allowlist()
                .iter()
                .map(|a| format!("0x{:02X}", a))
                .collect();
            eprintln!("Hint: Only allowlisted EC registers can be written:");
            eprintln!("      {}", allowed.join(" "));
            eprintln!("      New addresses need hardware verification before they are added.");
        }
        AppError::Config(ConfigError::FileNotFound(path)) => {
            eprintln!();
            eprintln!("Hint: Create {} or unset ECTUNE_CONFIG.", path);
        }
        _ => {}
    }
}
