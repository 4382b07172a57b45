use color_eyre::eyre::Result;

use forkful::app::App;
use forkful::cli::{Cli, Command, Resolution};
use forkful::config::ConfigManager;
use forkful::ids;
use forkful::logging;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse_args();

    let config = match &cli.config_dir {
        Some(dir) => ConfigManager::open(dir)?,
        None => ConfigManager::new()?,
    };
    let app_config = config.app_config().clone();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| app_config.general.log_level.clone());
    let _log_guard = logging::init(&level, app_config.general.log_file.as_deref())?;
    // Config was read before the subscriber existed; report what it noticed now
    config.log_diagnostics();

    if let Err(e) = config.write_default_configs() {
        tracing::warn!("Could not write default config to {}: {}", config.config_dir().display(), e);
    }

    // The identifier table is fixed from here on
    ids::install(config.identifiers().clone())?;
    let mapper = ids::global();

    match cli.command() {
        Command::Resolve { id, json } => {
            let resolution = Resolution::lookup(mapper, &id);
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                println!("{}", resolution.to_text());
            }
        }
        Command::Pairs => {
            for (canonical, legacy) in mapper.pairs() {
                println!("{}  {}", canonical, legacy);
            }
        }
        Command::Browse { threshold } => {
            let threshold = threshold.unwrap_or(app_config.visibility.threshold);
            let mut app = App::new(&app_config, mapper, threshold)?;
            app.run()?;
        }
    }

    Ok(())
}
