mod cli;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use cli::{Cli, Commands};
use opex_rs::{AnalysisPipeline, run_vroc};
use tracing_appender::non_blocking;
use tracing_subscriber::{EnvFilter, prelude::*};

fn open_log_writer(path: &Path) -> Result<non_blocking::NonBlocking> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
    let (writer, guard) = non_blocking(file);
    // The writer flushes on guard drop; keep it for the life of the process.
    let _guard = Box::leak(Box::new(guard));
    Ok(writer)
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    let file_layer = log_file
        .map(open_log_writer)
        .transpose()?
        .map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
}

fn log_invocation(log_file: Option<&PathBuf>) {
    let cwd = std::env::current_dir().ok();
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    tracing::info!("==================== new opex_cli run ====================");
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        cwd = ?cwd,
        log_file = ?log_file,
        argv = ?argv,
        "opex_cli invoked"
    );
    if argv.len() >= 2 {
        tracing::info!(
            "cargo_repro_command=cargo run --release -p opex_cli -- {}",
            argv[1..].join(" ")
        );
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Cycles(args) => {
            let config = args.into_config()?;
            AnalysisPipeline::new(config).run().map(|_| ())
        }
        Commands::Vroc(args) => run_vroc(&args.into_config()).map(|_| ()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli.command.log_file();
    init_tracing(log_file.as_deref())?;
    log_invocation(log_file.as_ref());

    run(cli.command).inspect_err(|err| {
        tracing::error!(error = format!("{err:#}"), "opex_cli failed");
    })
}
