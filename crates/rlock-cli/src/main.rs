mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::EXIT_FAILURE;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rlock",
    version,
    about = "Deterministic lock files for installed package environments"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Produce a lock file from an installed prefix.
    Lock {
        /// Prefix directory to lock.
        prefix: PathBuf,
        /// Output lock file path.
        #[arg(short, long, default_value = "rlock.lock")]
        file: PathBuf,
        /// Environment name recorded in the document.
        #[arg(long, default_value = rlock_core::DEFAULT_ENVIRONMENT)]
        environment: String,
        /// Target platform tag; derived from the records when omitted.
        #[arg(long)]
        platform: Option<String>,
    },
    /// Verify that a lock file is well-formed and canonical.
    Verify {
        /// Lock file to verify.
        #[arg(default_value = "rlock.lock")]
        file: PathBuf,
    },
    /// Refresh a prefix's lock file after an installer transaction.
    ///
    /// Meant to be wired into a package manager's post-command hook; it
    /// always exits 0 so a lock failure never fails the host command.
    Hook {
        /// Prefix the installer operated on.
        prefix: PathBuf,
        /// Hook settings file; built-in defaults apply when missing.
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RLOCK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Lock {
            prefix,
            file,
            environment,
            platform,
        } => commands::lock::run(&prefix, &file, &environment, platform.as_deref(), json_output),
        Commands::Verify { file } => commands::verify::run(&file, json_output),
        Commands::Hook { prefix, settings } => {
            commands::hook::run(&prefix, settings.as_deref(), json_output)
        }
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
