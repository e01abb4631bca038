mod cli;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "HOMOGLYPH_LOG";

#[derive(Parser)]
#[command(
    name = "homoglyph",
    version,
    about = "Detect and normalize confusable Unicode characters, one line at a time",
    after_help = "Examples:\n  echo 'Hello W\u{3BF}rld' | homoglyph\n  echo 'caf\u{E9}' | homoglyph --normalize nfd\n  echo 'suspicious text' | homoglyph --check"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    filter: cli::filter::FilterArgs,

    /// Log debug output to stderr (overridden by HOMOGLYPH_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile raw confusable data into a JSON table artifact
    Compile(cli::compile::CompileArgs),
    /// Show build, table and configuration details
    Doctor(cli::doctor::DoctorArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Compile(args)) => cli::compile::run(&args),
        Some(Commands::Doctor(args)) => Ok(cli::doctor::run(&args)),
        None => cli::filter::run(&cli.filter),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("homoglyph: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
