use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use recipe_viewer::database::connection::establish_pooled_connection;
use recipe_viewer::importer::{self, DEFAULT_IMPORT_PATH};
use recipe_viewer::logging::init_tracing;
use recipe_viewer::store::DatabaseStore;
use tracing::{info, Level};

/// Wipes all recipes and imports them from a JSON file.
#[derive(Parser, Debug)]
#[command(name = "import-recipes")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// JSON array of recipes with their steps and ingredients.
    #[arg(long, default_value = DEFAULT_IMPORT_PATH)]
    path: PathBuf,

    /// Import the built-in sample recipes instead of a file.
    #[arg(long)]
    sample: bool,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.log_level).context("Unable to set global subscriber")?;

    let recipes = if args.sample {
        info!("Loading sample recipes...");
        importer::sample_recipes()?
    } else {
        info!("Loading recipes from {}...", args.path.display());
        importer::load_file(&args.path)?
    };

    let pool = establish_pooled_connection(&args.database_url, 1)
        .context("Unable to create the database pool")?;
    let store = DatabaseStore::new(pool);

    info!("Clearing existing recipes and ingredients...");
    importer::import(&store, recipes)?;

    Ok(())
}
