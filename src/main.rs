use clap::Parser;
use color_eyre::Result;
use daybook::{
    Config, Database, Profile,
    cli::{Cli, Commands},
    logging, utils,
};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    // An explicit --config file keeps the paths written in it
    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(&utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    // A broken log directory should not stop the command itself
    if let Err(err) = logging::init_logging(&config.log_level, &config.get_log_dir()) {
        eprintln!("warning: file logging disabled: {}", err);
    }

    let db_path = config.get_database_path();
    let db = Database::new(&db_path)?;

    let command = cli.command.unwrap_or(Commands::Dashboard);
    daybook::cli::run(command, &db, &config, utils::today_local())?;

    Ok(())
}
