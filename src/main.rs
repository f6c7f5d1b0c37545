use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use restore_engine::compat::assets::ConventionAssetClassifier;
use restore_engine::compat::{CompatibilityChecker, CompatibilityDataResolver};
use restore_engine::config::{RestoreConfig, log_dir};
use restore_engine::framework::NuGetFramework;
use restore_engine::library::LibraryRange;
use restore_engine::lockfile::LockFile;
use restore_engine::provider::DependencyProvider;
use restore_engine::provider::local::LocalDependencyProvider;
use restore_engine::provider::remote::RemoteDependencyProvider;
use restore_engine::repository::LocalPackageRepository;
use restore_engine::source::http::HttpSourceRepository;
use restore_engine::version::VersionRange;

#[derive(Parser)]
#[command(name = "restore-engine")]
#[command(version, about = "Package resolution and compatibility checks for restore")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to a file in the data directory
    #[arg(long, global = true)]
    log_file: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a package reference and list its dependencies
    Resolve {
        /// Package name
        name: String,
        /// Version range, e.g. `1.0`, `[1.0, 2.0)` or `1.*`
        range: Option<String>,
        /// Target framework, e.g. `net45` or `netstandard2.0`
        #[arg(short, long)]
        framework: String,
        /// Resolve against the local package directory instead of the remote source
        #[arg(long)]
        local: bool,
    },
    /// Check the compatibility of the graph recorded in a lock file
    Check {
        #[arg(long)]
        lock_file: PathBuf,
        /// Target framework, e.g. `net45`
        #[arg(short, long)]
        framework: String,
        /// Runtime identifier, e.g. `win7-x64`
        #[arg(short, long)]
        runtime: Option<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.global.config {
        Some(path) => RestoreConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RestoreConfig::default(),
    };

    let log_dir = cli.global.log_file.then(log_dir);
    let _guard = restore_engine::logging::init(cli.global.verbose, log_dir.as_deref());

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: RestoreConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Resolve {
            name,
            range,
            framework,
            local,
        } => resolve(&config, name, range, &framework, local).await,
        Command::Check {
            lock_file,
            framework,
            runtime,
        } => check(&config, &lock_file, &framework, runtime),
    }
}

async fn resolve(
    config: &RestoreConfig,
    name: String,
    range: Option<String>,
    framework: &str,
    local: bool,
) -> anyhow::Result<ExitCode> {
    let framework: NuGetFramework = framework.parse()?;
    let version_range = range.as_deref().map(str::parse::<VersionRange>).transpose()?;
    let range = LibraryRange::new(name, version_range);

    let provider: Box<dyn DependencyProvider> = if local {
        Box::new(LocalDependencyProvider::new(LocalPackageRepository::new(
            config.packages_dir(),
        )))
    } else {
        Box::new(RemoteDependencyProvider::new(Arc::new(
            HttpSourceRepository::new(&config.source.url, config.source.timeout()),
        )))
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            ctrl_c.cancel();
        }
    });

    let Some(identity) = provider.find_library(&range, &framework, &cancel).await? else {
        println!("{} could not be resolved", range);
        return Ok(ExitCode::FAILURE);
    };

    println!("{}", identity);
    for dependency in provider
        .get_dependencies(&identity, &framework, &cancel)
        .await?
    {
        println!("  {}", dependency.library_range);
    }

    Ok(ExitCode::SUCCESS)
}

fn check(
    config: &RestoreConfig,
    lock_file_path: &std::path::Path,
    framework: &str,
    runtime: Option<String>,
) -> anyhow::Result<ExitCode> {
    let framework: NuGetFramework = framework.parse()?;
    let lock_file = LockFile::load(lock_file_path)
        .with_context(|| format!("Failed to load lock file {}", lock_file_path.display()))?;

    let graph = lock_file
        .target_graph(&framework, runtime.as_deref())
        .with_context(|| {
            format!(
                "Lock file has no target for {}{}",
                framework,
                runtime.as_deref().map(|rid| format!("/{}", rid)).unwrap_or_default()
            )
        })?;

    let repository = LocalPackageRepository::new(config.packages_dir());
    let classifier = ConventionAssetClassifier;
    let resolver = CompatibilityDataResolver::new(&lock_file, &repository, &classifier);
    let result = CompatibilityChecker::new(resolver).check(&graph)?;

    if result.success() {
        info!("All packages are compatible with {}", graph.name);
        println!("{}: {} packages compatible", graph.name, graph.flattened.len());
        return Ok(ExitCode::SUCCESS);
    }

    for issue in &result.issues {
        println!("{}", issue);
    }
    Ok(ExitCode::FAILURE)
}
