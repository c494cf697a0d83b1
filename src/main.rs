//! pysh: make Python scripts executable from any POSIX shell.
#![allow(clippy::multiple_crate_versions)]

use clap::{ArgAction, Parser, Subcommand};
use pysh::config::Config;
use pysh::generate::{Generator, Mode, ScriptPath};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pysh")]
#[command(version)]
#[command(about = "Turn Python scripts into self-bootstrapping shell executables", long_about = None)]
struct Args {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to pysh.toml in the working directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Interpreter to try, in order of preference (repeatable)
    #[arg(long, short = 'i', value_name = "BIN", global = true)]
    interpreter: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add or refresh the bootstrap header
    Gen {
        /// Script to rewrite in place, or - for stdin to stdout
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Add the bootstrap header and embed the runtime
    Dist {
        /// Script to rewrite in place, or - for stdin to stdout
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Runtime source tree to embed
        #[arg(long, value_name = "DIR")]
        runtime: Option<PathBuf>,
    },
    /// Print the section structure of a script as JSON
    Inspect {
        /// Script to read, or - for stdin
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pysh: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> pysh::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    // Override config with command line args
    if !args.interpreter.is_empty() {
        cfg.interpreters = args.interpreter;
    }
    if let Command::Dist {
        runtime: Some(dir), ..
    } = &args.command
    {
        cfg.runtime_dir = dir.to_string_lossy().into_owned();
    }
    debug!(?cfg, "effective configuration");

    let generator = Generator::from_config(&cfg)?;
    match args.command {
        Command::Gen { script } => generator.generate(&ScriptPath::new(script), Mode::Header),
        Command::Dist { script, .. } => {
            generator.generate(&ScriptPath::new(script), Mode::Distributable)
        }
        Command::Inspect { script } => {
            let document = generator.read(&ScriptPath::new(script))?;
            let json = serde_json::to_string_pretty(&document.outline())?;
            println!("{json}");
            Ok(())
        }
    }
}
