//! DMRInfo - ConnectionManager report of the DLNA Media Renderers on the LAN
//!
//! Discovers the renderers by SSDP, then prints the answers to
//! `GetProtocolInfo` and `GetCurrentConnectionIDs` of each one.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dmrconfig::Config;
use dmrcontrol::{FailurePolicy, ReportAggregator, ReportOptions, SsdpSearcher, UreqTransport};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

/// Longest discovery window accepted on the command line
const MAX_WINDOW_SECS: u64 = 3600;

/// DMRInfo - Query the ConnectionManager of every Media Renderer on the LAN
#[derive(Parser, Debug)]
#[command(name = "DMRInfo")]
#[command(version, about, long_about = None)]
struct Args {
    /// SSDP discovery window in seconds (overrides the configuration)
    #[arg(
        short,
        long,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(..=MAX_WINDOW_SECS)
    )]
    window: Option<u64>,

    /// Configuration directory containing config.yaml
    #[arg(short, long, value_name = "DIR")]
    config_dir: Option<String>,

    /// Report per-device errors inline instead of aborting
    #[arg(short, long)]
    keep_going: bool,

    /// Re-indent SOAP responses that are well-formed XML
    #[arg(short, long)]
    pretty: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(args: &Args) -> Result<Config> {
    let config = Config::load_config(args.config_dir.as_deref().unwrap_or(""))
        .context("Cannot load configuration")?;

    if let Some(window) = args.window {
        config.set_discovery_window_secs(window);
    }
    if args.keep_going {
        config.set_keep_going(true);
    }
    if args.pretty {
        config.set_pretty_print(true);
    }

    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    let options = ReportOptions {
        policy: if config.get_keep_going() {
            FailurePolicy::Inline
        } else {
            FailurePolicy::Abort
        },
        pretty_print: config.get_pretty_print(),
    };
    let transport = UreqTransport::new(config.get_description_timeout(), config.get_soap_timeout());
    debug!(
        "Timeouts: description {:?}, SOAP {:?}; options {:?}",
        config.get_description_timeout(),
        config.get_soap_timeout(),
        options
    );

    let window = config.get_discovery_window();
    info!("📡 Searching Media Renderers for {:?}...", window);

    let report = ReportAggregator::new(SsdpSearcher::new(), transport)
        .with_options(options)
        .run(window)?;
    info!("✅ Report ready for {} device(s)", report.device_count());

    let mut stdout = io::stdout().lock();
    stdout.write_all(report.as_str().as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
