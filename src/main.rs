//! bsaguard - Archive version audit for Bethesda game installations
//!
//! Main entry point for the command line application.
//!
//! # Overview
//!
//! The binary initializes:
//! - Logging infrastructure (file rotation, console output with `--debug`)
//! - Tokio async runtime for archive reads
//! - Configuration loading ([`ConfigManager`])
//! - The audit pipeline ([`AuditService`]) over a [`StateManager`]
//!
//! # Commands
//!
//! - `check`: audit one installation, print the detail report, exit with code 2
//!   when incompatible archives were found
//! - `games`: list the known game profiles
//! - `inspect`: print the header version of individual archive files
//!
//! # Configuration Files
//!
//! Expected in `bsaguard Data/` (or `--config-dir`):
//! - `bsaguard Main.yaml`: game profiles and native plugin lists
//! - `bsaguard Config.yaml`: game, paths and logging preferences, overridable
//!   with `BSAGUARD_*` environment variables

use anyhow::{Context, Result, bail};
use bsaguard::config::ConfigManager;
use bsaguard::models::{GameProfiles, MainConfig, ModRegistry, UserConfig};
use bsaguard::services::{
    AuditError, AuditInputs, AuditOutcome, AuditService, detect_game_from_load_order,
    intended_games, load_plugins_txt, try_read_version,
};
use bsaguard::{APP_NAME, AuditMetrics, StateChange, StateManager, VERSION};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

/// Exit code of `check` when incompatible archives were found.
const ISSUES_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "bsaguard", version, about = "Find archives built for the wrong game")]
struct Cli {
    /// Directory holding bsaguard's YAML configuration
    #[arg(long, global = true, default_value = "bsaguard Data")]
    config_dir: Utf8PathBuf,

    /// Debug logging, mirrored to the console
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit the archives of a game installation
    Check {
        /// Game id (see `bsaguard games`); detected from the load order when omitted
        #[arg(short, long)]
        game: Option<String>,

        /// Root of the game installation (the folder containing `Data`)
        #[arg(long)]
        game_path: Option<Utf8PathBuf>,

        /// Load order file (`plugins.txt`)
        #[arg(short, long)]
        plugins: Option<Utf8PathBuf>,

        /// Mod registry YAML
        #[arg(short, long)]
        mods: Option<Utf8PathBuf>,
    },
    /// List the known game profiles
    Games,
    /// Print the header version of archive files
    Inspect {
        #[arg(required = true, num_args = 1..)]
        archives: Vec<Utf8PathBuf>,
    },
}

struct CheckArgs {
    game: Option<String>,
    game_path: Option<Utf8PathBuf>,
    plugins: Option<Utf8PathBuf>,
    mods: Option<Utf8PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (loaded, settings) = load_configuration(&cli.config_dir);
    let debug = cli.debug || settings.debug_mode;

    // Held until exit so buffered log lines are flushed
    let _log_guard = bsaguard::logging::setup_logging(
        &settings.log_dir,
        APP_NAME,
        debug,
        debug,
        settings.json_logs,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let result = loaded
        .context("Failed to load user configuration")
        .and_then(|(config_manager, user_config)| run(cli.command, &config_manager, &user_config));

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Load the config manager and user settings, plus the settings logging
/// should start with.
///
/// A load failure falls back to default settings so it can still be logged.
fn load_configuration(config_dir: &Utf8Path) -> (Result<(ConfigManager, UserConfig)>, UserConfig) {
    let loaded = ConfigManager::new(config_dir).and_then(|manager| {
        let user_config = manager.load_user_config()?;
        Ok((manager, user_config))
    });
    let settings = match &loaded {
        Ok((_, user_config)) => user_config.clone(),
        Err(_) => UserConfig::default(),
    };
    (loaded, settings)
}

fn run(
    command: Commands,
    config_manager: &ConfigManager,
    user_config: &UserConfig,
) -> Result<ExitCode> {
    let main_config = config_manager.load_main_config()?;
    let profiles = main_config
        .profiles()
        .context("Invalid game profiles in main config")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("bsaguard-worker")
        .build()?;

    let metrics = Arc::new(AuditMetrics::new());

    let result = match command {
        Commands::Check {
            game,
            game_path,
            plugins,
            mods,
        } => {
            let args = CheckArgs {
                game,
                game_path,
                plugins,
                mods,
            };
            runtime.block_on(run_check(
                args,
                config_manager,
                user_config,
                &main_config,
                profiles,
                Arc::clone(&metrics),
            ))
        }
        Commands::Games => {
            print_games(&profiles);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect { archives } => runtime.block_on(run_inspect(&profiles, &archives)),
    };

    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));
    result
}

async fn run_check(
    args: CheckArgs,
    config_manager: &ConfigManager,
    user_config: &UserConfig,
    main_config: &MainConfig,
    profiles: GameProfiles,
    metrics: Arc<AuditMetrics>,
) -> Result<ExitCode> {
    let plugins_txt = args
        .plugins
        .or_else(|| user_config.plugins_txt.as_deref().map(Utf8PathBuf::from));

    let game_id = match args.game.or_else(|| user_config.game_id.clone()) {
        Some(game_id) => game_id,
        None => match &plugins_txt {
            Some(path) => match detect_game_from_load_order(path)? {
                Some(game_id) => game_id,
                None => bail!("Could not detect the game from {}, pass --game", path),
            },
            None => bail!("No game given, pass --game or --plugins"),
        },
    };

    let plugins = match &plugins_txt {
        Some(path) => load_plugins_txt(path, |name| main_config.is_native_plugin(&game_id, name))?,
        None => {
            tracing::warn!("No load order file given, no plugin will be checked");
            Vec::new()
        }
    };

    let registry = match args
        .mods
        .or_else(|| user_config.mods_file.as_deref().map(Utf8PathBuf::from))
    {
        Some(path) => config_manager.load_mod_registry(&path)?,
        None => ModRegistry::default(),
    };

    let mut inputs = AuditInputs::new(&game_id)
        .with_plugins(plugins)
        .with_registry(&registry);
    if let Some(game_path) = args
        .game_path
        .or_else(|| user_config.game_path.as_deref().map(Utf8PathBuf::from))
    {
        inputs = inputs.with_game_path(game_path);
    }

    let service = AuditService::new(profiles, StateManager::new(), metrics);
    let progress = tokio::spawn(print_progress(service.state().subscribe()));

    let outcome = service.check(&inputs).await;
    let details = service.state().show_details();

    // Dropping the last sender lets the printer drain and stop
    drop(service);
    if let Err(e) = progress.await {
        tracing::warn!("Progress printer stopped abnormally: {}", e);
    }

    let exit_code = match outcome {
        AuditOutcome::IssuesFound(report) => {
            println!("{}", details.unwrap_or_else(|| report.to_string()));
            ExitCode::from(ISSUES_EXIT_CODE)
        }
        AuditOutcome::Clean { checked } => {
            println!("All {} checked archives are compatible", checked);
            ExitCode::SUCCESS
        }
        AuditOutcome::NothingToCheck => {
            println!("No archives belong to enabled plugins");
            ExitCode::SUCCESS
        }
        AuditOutcome::Skipped(err @ AuditError::UnsupportedGame(_)) => {
            eprintln!("{}", err);
            ExitCode::SUCCESS
        }
        AuditOutcome::Skipped(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    };

    Ok(exit_code)
}

/// Mirror the "checking" notification on stderr.
async fn print_progress(mut changes: broadcast::Receiver<StateChange>) {
    loop {
        match changes.recv().await {
            Ok(StateChange::ProgressUpdated {
                progress, message, ..
            }) => eprintln!("[{:>3}%] {}", progress, message),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_games(profiles: &GameProfiles) {
    println!("{:<24} {:<26} {:>7}  Kind", "Id", "Name", "Version");
    for profile in profiles.iter() {
        println!(
            "{:<24} {:<26} {:>7}  {}",
            profile.game_id, profile.display_name, profile.expected_version, profile.archive_kind
        );
    }
}

async fn run_inspect(profiles: &GameProfiles, archives: &[Utf8PathBuf]) -> Result<ExitCode> {
    for path in archives {
        match try_read_version(path).await {
            Ok(version) => println!(
                "{}: version {} ({})",
                path,
                version,
                intended_games(profiles, version)
            ),
            Err(e) => println!("{}: unreadable ({})", path, e),
        }
    }
    Ok(ExitCode::SUCCESS)
}
