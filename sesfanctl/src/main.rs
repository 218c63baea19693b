//! sesfan CLI
//!
//! Reads and sets fan speeds on ThinkServer SA120 enclosures.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use sesfan_core::{DefaultEnclosure, SesFanError};
use sesfan_hardware::{EnclosureController, SgSesDriver};
use sesfanctl::cli::{find_enclosures, generate_completion, handle_enclosure, Cli, OutputFormat};
use sesfanctl::config::CliConfig;
use sesfanctl::format::{format_results_json, format_unsupported, EnclosureResult};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate_completion(shell);
        return Ok(());
    }

    // Build configuration using priority chain: defaults → file → env → CLI args
    let mut builder = CliConfig::builder();

    // Load config file (unless --no-config is specified)
    builder = builder.with_config_file(!cli.no_config, cli.config.as_deref())?;

    // Apply environment variable overrides
    builder = builder.with_env_overrides();

    // Apply CLI argument overrides (highest priority)
    if let Some(ref sg_ses) = cli.sg_ses {
        builder = builder.with_sg_ses_path(sg_ses)?;
    }
    if let Some(ref format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }

    // Build final configuration with validation
    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.verbose);

    let output_format = OutputFormat::from_config(&config.output_format);

    let driver = SgSesDriver::<DefaultEnclosure>::new(&config.sg_ses_path);
    let controller = EnclosureController::new(driver);

    let enclosures = find_enclosures(&controller, &config, cli.device.as_deref()).await;
    if enclosures.is_empty() {
        println!("{}", SesFanError::EnclosureNotFound);
        std::process::exit(1);
    }

    let Some(mode) = cli.mode() else {
        eprintln!("{}", Cli::command().render_help());
        return Ok(());
    };

    let mut results = Vec::with_capacity(enclosures.len());

    for enclosure in &enclosures {
        let outcome = handle_enclosure(&controller, enclosure, mode, &config, &output_format);

        match outcome.await {
            Ok(result) => {
                if let OutputFormat::Table = output_format {
                    println!("\nDone");
                }
                results.push(result);
            }
            Err(e) => {
                eprintln!("{}", format_unsupported(enclosure.path(), &e));
                if config.verbose {
                    eprintln!("Error details: {:?}", e);
                }
                results.push(EnclosureResult::failed(enclosure.path(), &e));
            }
        }
    }

    if let OutputFormat::Json = output_format {
        println!("{}", format_results_json(&results)?);
    }

    Ok(())
}

/// Log to stderr; RUST_LOG takes precedence over the verbose flag
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
