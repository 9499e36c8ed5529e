mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Inputs, EXIT_FAILURE, EXIT_INTEGRITY_ERROR, EXIT_MANIFEST_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "roleforge",
    version,
    about = "Load releases, resolve roles, and compute content-addressed role versions"
)]
struct Cli {
    /// Project config file (defaults to ./roleforge.json when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Final release directory to load. Repeatable; replaces the config's releases.
    #[arg(long, global = true)]
    release: Vec<PathBuf>,

    /// Dev release directory to load. Repeatable; replaces the config's releases.
    #[arg(long, global = true)]
    dev_release: Vec<PathBuf>,

    /// Cache directory holding dev release archives (defaults to ~/.bosh/cache).
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Role manifest to resolve against the loaded releases.
    #[arg(long, global = true)]
    role_manifest: Option<PathBuf>,

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
    /// Print every role's dev version and the manifest's aggregate version.
    Versions {
        /// Extra input mixed into the manifest version (overrides the config's salt).
        #[arg(long)]
        salt: Option<String>,
    },
    /// Check every package, job, and license archive against its checksum.
    Verify,
    /// Show a release's header, packages, jobs, and license files.
    ShowRelease {
        /// Release directory.
        path: PathBuf,
        /// Treat the directory as a dev release.
        #[arg(long, default_value_t = false)]
        dev: bool,
        /// List job properties aggregated across jobs instead.
        #[arg(long, default_value_t = false)]
        configs: bool,
    },
    /// Extract one package archive of a release.
    Extract {
        /// Release directory.
        path: PathBuf,
        /// Package name.
        package: String,
        /// Directory to extract into; a fresh subdirectory is created.
        dest: PathBuf,
        /// Treat the directory as a dev release.
        #[arg(long, default_value_t = false)]
        dev: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
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
            tracing_subscriber::EnvFilter::try_from_env("ROLEFORGE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Versions { ref salt } => Inputs::resolve(
            cli.config.as_deref(),
            &cli.release,
            &cli.dev_release,
            cli.cache_dir.as_deref(),
            cli.role_manifest.as_deref(),
            salt.as_deref(),
        )
        .and_then(|inputs| commands::versions::run(&inputs, json_output)),
        Commands::Verify => Inputs::resolve(
            cli.config.as_deref(),
            &cli.release,
            &cli.dev_release,
            cli.cache_dir.as_deref(),
            cli.role_manifest.as_deref(),
            None,
        )
        .and_then(|inputs| commands::verify::run(&inputs, json_output)),
        Commands::ShowRelease { path, dev, configs } => commands::show_release::run(
            &path,
            dev,
            cli.cache_dir.as_deref(),
            configs,
            json_output,
        ),
        Commands::Extract {
            path,
            package,
            dest,
            dev,
        } => commands::extract::run(
            &path,
            dev,
            cli.cache_dir.as_deref(),
            &package,
            &dest,
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") || msg.starts_with("config error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("integrity error:") {
                EXIT_INTEGRITY_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
