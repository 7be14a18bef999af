use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use display_settings_manager::config::{Config, ConfigLoader};
use display_settings_manager::logging::{LoggingConfig, cleanup_old_logs, initialize_logging};
use display_settings_manager::persistence::FilePersistentState;
use display_settings_manager::settings::SettingsManager;
use display_settings_manager::system::{
    NoopAudioContext, SimulatedDisplaySystem, StandardFileSystem,
};

type Manager = SettingsManager<
    SimulatedDisplaySystem<StandardFileSystem>,
    NoopAudioContext,
    FilePersistentState<StandardFileSystem>,
>;

#[derive(Parser)]
#[command(name = "display-settings")]
#[command(about = "Capture and restore multi-monitor display configuration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated display layout document (overrides paths.display_file)
    #[arg(short, long)]
    display_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Display(DisplayCommand),
    /// Validate configuration file
    CheckConfig,
}

/// Commands that talk to the display backend
#[derive(Subcommand)]
enum DisplayCommand {
    /// List all known display devices
    ListDevices,
    /// Print the current point-in-time display configuration
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a restore profile for the current display configuration
    ExportProfile {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore the display configuration from a profile file
    Restore {
        /// Profile produced by export-profile
        profile: PathBuf,
    },
    /// Retain the current display configuration in the state file
    SaveProfile,
    /// Restore the retained display configuration and forget it
    RestoreSaved,
    /// Forget the retained display configuration
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::new_production(path.clone()),
        None => ConfigLoader::new_with_default_path()?,
    };
    let config = loader.load_config()?;

    let mut logging = LoggingConfig::from_general(&config.general, cli.verbose);
    logging.json_format |= cli.json_logs;
    let (_guard, log_dir) = initialize_logging(logging)?;

    info!(
        "Configuration loaded from {}",
        loader.get_config_path().display()
    );

    if let Some(log_dir) = log_dir {
        if let Err(e) = cleanup_old_logs(&log_dir, config.general.log_retention_days) {
            warn!("Failed to clean up old log files: {:#}", e);
        }
    }

    match cli.command {
        Commands::CheckConfig => check_config(&config, loader.get_config_path()),
        Commands::Display(command) => {
            let manager = build_manager(&config, cli.display_file)?;
            run(&manager, command)
        }
    }
}

fn build_manager(config: &Config, display_file: Option<PathBuf>) -> Result<Manager> {
    let Some(display_file) = display_file.or_else(|| config.paths.display_file.clone()) else {
        bail!("No display layout configured, pass --display-file or set paths.display_file");
    };

    let dd_api = SimulatedDisplaySystem::load(StandardFileSystem, display_file)?;
    let state_file = config.paths.state_file_or_default()?;
    let persistent_state = FilePersistentState::new(StandardFileSystem, state_file);
    info!(
        "Using display layout {} and state file {}",
        dd_api.get_path().display(),
        persistent_state.get_state_path().display()
    );

    Ok(SettingsManager::without_audio_context(
        dd_api,
        persistent_state,
        config.workarounds.clone(),
    ))
}

fn run(manager: &Manager, command: DisplayCommand) -> Result<()> {
    match command {
        DisplayCommand::ListDevices => list_devices(manager),
        DisplayCommand::Export { output } => {
            let payload = manager
                .export_current_settings()
                .context("Failed to capture current display settings")?;
            write_payload(&payload, output.as_deref())
        }
        DisplayCommand::ExportProfile { output } => {
            let payload = manager
                .export_restore_profile()
                .context("Failed to capture current display settings")?;
            write_payload(&payload, output.as_deref())
        }
        DisplayCommand::Restore { profile } => {
            let data = std::fs::read(&profile)
                .with_context(|| format!("Failed to read profile: {}", profile.display()))?;
            manager.restore_from_profile(&data)?;
            println!("✓ Display settings restored from {}", profile.display());
            Ok(())
        }
        DisplayCommand::SaveProfile => {
            if !manager.save_restore_profile() {
                bail!("Failed to save current display settings");
            }
            println!("✓ Current display settings saved");
            Ok(())
        }
        DisplayCommand::RestoreSaved => {
            manager.restore_from_persistence()?;
            println!("✓ Saved display settings restored");
            Ok(())
        }
        DisplayCommand::Reset => {
            if !manager.reset_persistence() {
                bail!("Failed to reset saved display settings");
            }
            println!("✓ Saved display settings cleared");
            Ok(())
        }
    }
}

fn list_devices(manager: &Manager) -> Result<()> {
    let devices = manager.enum_available_devices();

    println!("Available display devices:");
    if devices.is_empty() {
        println!("  No display devices found!");
        return Ok(());
    }

    for (i, device) in devices.iter().enumerate() {
        println!("  {}. {}", i + 1, device);
        let display_name = manager.get_display_name(&device.device_id);
        if !display_name.is_empty() {
            println!("     Display name: {}", display_name);
        }
    }

    Ok(())
}

fn write_payload(payload: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, payload)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Written to {}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(payload)),
    }
    Ok(())
}

fn check_config(config: &Config, path: &Path) -> Result<()> {
    info!("Validating configuration");

    config.validate()?;

    println!("Configuration validation ({}):", path.display());
    println!("  ✓ Configuration file parsed successfully");
    println!("  ✓ Log level: {}", config.general.log_level);
    if config.general.log_file {
        match &config.general.log_dir {
            Some(dir) => println!("  ✓ Log files: {}", dir.display()),
            None => println!("  ✓ Log files: default directory"),
        }
        println!(
            "  ✓ Log retention: {} days",
            config.general.log_retention_days
        );
    }
    match config.workarounds.hdr_blank_delay_ms {
        Some(delay) => println!("  ✓ HDR blanking delay: {}ms", delay),
        None => println!("  ✓ HDR blanking disabled"),
    }
    println!(
        "  ✓ State file: {}",
        config.paths.state_file_or_default()?.display()
    );
    match &config.paths.display_file {
        Some(file) => println!("  ✓ Display layout: {}", file.display()),
        None => println!("  - No display layout configured"),
    }

    Ok(())
}
