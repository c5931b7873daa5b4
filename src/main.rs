//! Airlift CLI entrypoint.
//!
//! This is the main entrypoint for the airlift command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use airlift::cli::{Cli, Commands, OutputFormatter};
use airlift::config::{find_config_file, ConfigParser, ConfigValidator, DeployConfig};
use airlift::deploy::Deployer;
use airlift::error::Result;
use airlift::DeployOptions;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output, cli.verbose);

    match cli.command {
        Commands::Init { path, force } => {
            cmd_init(&path, force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { warnings } => {
            cmd_validate(cli.config.as_ref(), warnings, &formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Deploy {
            environment,
            token,
            timeout,
        } => cmd_deploy(cli.config.as_ref(), environment, token, timeout, &formatter).await,
    }
}

/// Initialize a new project.
fn cmd_init(path: &PathBuf, force: bool) -> Result<()> {
    let config_path = path.join("airlift.deploy.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    let config_template = include_str!("../templates/airlift.deploy.yaml");
    std::fs::write(&config_path, config_template)?;
    eprintln!("Created: {}", config_path.display());

    let env_template = include_str!("../templates/.env.example");
    std::fs::write(&env_path, env_template)?;
    eprintln!("Created: {}", env_path.display());

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if !existing.contains(".env") {
            let mut updated = existing;
            updated.push_str("\n# Airlift\n.env\n");
            std::fs::write(&gitignore_path, updated)?;
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nProject initialized successfully!");
    eprintln!("Next steps:");
    eprintln!("  1. Copy .env.example to .env and set AIRLIFT_TOKEN");
    eprintln!("  2. Edit airlift.deploy.yaml with your application name and root");
    eprintln!("  3. Run 'airlift validate' to check your configuration");
    eprintln!("  4. Run 'airlift deploy' to push your application");

    Ok(())
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (config, result) = {
        let (config, _base) = load_config(config_path)?;
        let validation = ConfigValidator::new().validate(&config)?;
        (config, validation)
    };

    eprintln!("{}", formatter.format_validation(&result, show_warnings));

    eprintln!("\nConfiguration summary:");
    eprintln!("  Application: {}", config.name);
    eprintln!("  Root: {}", config.root.as_deref().unwrap_or("."));
    eprintln!("  Exclusions: {}", config.exclude.len());

    Ok(())
}

/// Deploy the application.
async fn cmd_deploy(
    config_path: Option<&PathBuf>,
    environment: String,
    token: Option<String>,
    timeout_secs: u64,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let (config, base_dir) = load_config(config_path)?;

    // The .env file is loaded by now, so fall back to AIRLIFT_TOKEN for
    // callers that did not pass --token.
    let token = token.map_or_else(ConfigParser::get_token, Ok)?;

    let options = DeployOptions::new(token)
        .with_environment(environment)
        .with_timeout(Duration::from_secs(timeout_secs));

    let deployer = Deployer::new(config, options)?.with_base_dir(&base_dir);
    let mut handle = deployer.start();

    let mut saw_error = false;
    while let Some(event) = handle.next_event().await {
        if matches!(event, airlift::StatusEvent::Error { .. }) {
            saw_error = true;
        }
        if let Some(line) = formatter.format_event(&event) {
            eprintln!("{line}");
        }
    }

    match handle.wait().await {
        Ok(outcome) => {
            eprintln!("{}", formatter.format_outcome(&outcome));
            Ok(ExitCode::SUCCESS)
        }
        // The failure was already rendered as the terminal error event.
        Err(_) if saw_error => Ok(ExitCode::FAILURE),
        Err(e) => Err(e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads and validates configuration, returning it with its base directory.
fn load_config(config_path: Option<&PathBuf>) -> Result<(DeployConfig, PathBuf)> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let base_dir = config_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let parser = ConfigParser::new().with_base_path(&base_dir);
    parser.load_dotenv()?;

    let config = parser.load_with_env(&config_file)?;
    ConfigValidator::new().validate(&config)?;

    Ok((config, base_dir))
}
