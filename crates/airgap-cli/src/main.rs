mod commands;

use airgap_core::{install_signal_handler, BundleConfig, CancelToken, ExportRequest, ImportRequest};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    EXIT_CANCELLED, EXIT_FAILURE, EXIT_INVALID_INPUT, EXIT_MANIFEST_ERROR, EXIT_REGISTRY_ERROR,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "airgap",
    version,
    about = "Bundle platform images into tar archives and publish them to an air-gapped registry"
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

    /// Config file (default: ~/.config/airgap/config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct ResolveArgs {
    /// Platform version to bundle, e.g. v1.5.0.
    #[arg(long = "version", alias = "tkgVersion", value_name = "VERSION")]
    platform_version: String,
    /// Private registry repository the archives will be published to.
    #[arg(long, alias = "customImageRepo")]
    dest_repo: String,
    /// Public repository to pull from (overrides config file).
    #[arg(long, alias = "tkgImageRepository")]
    source_repo: Option<String>,
    /// Abort after this many seconds (overrides config file).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Copy every image of a platform version into tar archives.
    Export {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Directory the archives and the manifest are written to.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Resolve and list the images without copying anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Publish the archives of a bundle directory to the private registry.
    Import {
        /// Directory holding the archives and publish-images-fromtar.yaml.
        #[arg(long, alias = "tkgTarFilePath", default_value = ".")]
        bundle_dir: PathBuf,
        /// CA certificate of the private registry.
        #[arg(long, alias = "customRepoCertificate")]
        ca_cert: Option<PathBuf>,
        /// Abort after this many seconds (overrides config file).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Show the images a platform version resolves to, without copying.
    Plan {
        #[command(flatten)]
        resolve: ResolveArgs,
    },
    /// Print the manifest of a bundle directory.
    Inspect {
        /// Directory holding publish-images-fromtar.yaml.
        #[arg(long, default_value = ".")]
        bundle_dir: PathBuf,
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
            tracing_subscriber::EnvFilter::try_from_env("AIRGAP_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Export {
            resolve,
            output_dir,
            dry_run,
        } => with_config(cli.config.as_deref(), resolve.timeout, |config, cancel| {
            let request = export_request(&resolve, config, output_dir, dry_run);
            let client = commands::make_client(config);
            let engine = airgap_core::Engine::new(&client, config.clone());
            commands::export::run(&engine, &request, cancel, json_output)
        }),
        Commands::Import {
            bundle_dir,
            ca_cert,
            timeout,
        } => with_config(cli.config.as_deref(), timeout, |config, cancel| {
            let client = commands::make_client(config);
            let engine = airgap_core::Engine::new(&client, config.clone());
            let request = ImportRequest {
                bundle_dir,
                ca_cert,
            };
            commands::import::run(&engine, &request, cancel, json_output)
        }),
        Commands::Plan { resolve } => {
            with_config(cli.config.as_deref(), resolve.timeout, |config, cancel| {
                let request = export_request(&resolve, config, PathBuf::from("."), true);
                let client = commands::make_client(config);
                let engine = airgap_core::Engine::new(&client, config.clone());
                commands::plan::run(&engine, &request, cancel, json_output)
            })
        }
        Commands::Inspect { bundle_dir } => commands::inspect::run(&bundle_dir, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

/// Load the config, arm the cancel token, and run `f`.
fn with_config(
    path: Option<&Path>,
    timeout: Option<u64>,
    f: impl FnOnce(&BundleConfig, &CancelToken) -> Result<u8, String>,
) -> Result<u8, String> {
    let config = match path {
        Some(p) => BundleConfig::load(p),
        None => BundleConfig::load_default(),
    }
    .map_err(|e| e.to_string())?;

    let mut cancel = CancelToken::new();
    if let Some(secs) = timeout.or(config.timeout_secs) {
        cancel = cancel.with_timeout(Duration::from_secs(secs));
    }
    install_signal_handler(cancel.clone());
    f(&config, &cancel)
}

fn export_request(
    args: &ResolveArgs,
    config: &BundleConfig,
    output_dir: PathBuf,
    dry_run: bool,
) -> ExportRequest {
    ExportRequest {
        platform_version: args.platform_version.clone(),
        source_repo: args
            .source_repo
            .clone()
            .unwrap_or_else(|| config.source_repo.clone()),
        dest_repo: args.dest_repo.clone(),
        output_dir,
        dry_run,
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("invalid version tag")
        || msg.starts_with("invalid configuration:")
        || msg.starts_with("config error:")
    {
        EXIT_INVALID_INPUT
    } else if msg.starts_with("manifest error:") {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("registry error:") {
        EXIT_REGISTRY_ERROR
    } else if msg.starts_with("interrupted:") {
        EXIT_CANCELLED
    } else {
        EXIT_FAILURE
    }
}
