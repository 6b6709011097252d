use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal as _};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tabproxy_core::ProxyRegistry;
use tabproxy_host::{run_session, SessionConfig};
use tracing_subscriber::{fmt, EnvFilter};

const ENV_LOG: &str = "TABPROXY_LOG";

#[derive(Parser)]
#[command(name = "tabproxy-host")]
#[command(about = "Drive tabular proxies with NDJSON requests.", long_about = None)]
struct Cli {
    /// Request file, one JSON request per line (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Response file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print a JSON session report on stderr.
    #[arg(long)]
    report: bool,

    /// Log filter, e.g. `debug` or `tabproxy_core=trace`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    /// Stop the session at the first fatal handle error.
    #[arg(long)]
    strict_handles: bool,

    #[arg(long, value_name = "BYTES")]
    max_request_bytes: Option<u32>,
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn init_logging(cli_filter: Option<&str>) -> Result<()> {
    let filter = match cli_filter {
        Some(f) => EnvFilter::try_new(f).with_context(|| format!("invalid --log filter {f:?}"))?,
        None => EnvFilter::try_from_env(ENV_LOG).or_else(|_| EnvFilter::try_new("warn"))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .init();
    Ok(())
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;

    let mut config = SessionConfig::from_env();
    config.strict_handles |= cli.strict_handles;
    if let Some(max) = cli.max_request_bytes.filter(|&m| m != 0) {
        config.max_request_bytes = max;
    }

    let manager = tabproxy_tabular::new_manager(ProxyRegistry::global());

    let input: Box<dyn io::BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("open input {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn io::Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create output {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let report = run_session(&manager, input, output, &config)?;

    if cli.report {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(std::process::ExitCode::from(report.exit_code()))
}
