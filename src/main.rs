//! nvtel - NVML-based GPU telemetry tool
//!
//! A command-line tool for reading NVIDIA GPU properties by name.

use clap::Parser;
use nvtel::cli::args::{generate_completions, Cli, Commands};
use nvtel::commands::{run_get, run_info, run_list, run_properties};
use nvtel::config::{Config, ConfigBuilder};
use nvtel::error::{AppError, TelemetryError};
use nvtel::nvml::Session;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Completions need neither config nor the native library
    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging; --verbose selects the debug filter
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_filter()),
    )
    .format_timestamp(None)
    .init();

    // Run the appropriate command
    let result = run(&cli, &config);

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
        .with_library(cli.library.clone())
        .with_strict(cli.strict.then_some(true))
        .with_format(cli.format)
        .build();
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let session = Session::init(config.library.path.as_deref())?;

    match &cli.command {
        Commands::List => run_list(session, config),

        Commands::Info(args) => run_info(session, config, cli.gpu, args),

        Commands::Get { property } => run_get(session, config, cli.gpu, property),

        Commands::Properties => run_properties(session, config),

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
        AppError::Telemetry(TelemetryError::SessionInitFailed(_)) => {
            eprintln!();
            eprintln!("Hint: Make sure the NVIDIA driver is installed.");
            eprintln!("      On Linux, install the nvidia-utils package,");
            eprintln!("      or point --library at libnvidia-ml.so.1.");
        }
        AppError::Telemetry(TelemetryError::UnknownProperty(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'nvtel properties' to see supported names.");
        }
        AppError::Telemetry(TelemetryError::NoDevicesFound) => {
            eprintln!();
            eprintln!("Hint: Make sure you have an NVIDIA GPU installed.");
            eprintln!("      Check 'nvidia-smi' for GPU detection.");
        }
        _ => {}
    }
}
