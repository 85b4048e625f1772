// Copyright 2026 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use recipe_share::{data_path, database, generate_pdf, import};
use std::path::PathBuf;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed the ingredient reference data from a (name, unit) CSV file
    ImportIngredients { path: PathBuf },
    /// Render a user's aggregated shopping cart as a PDF and open it
    ShoppingList { username: String },
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse();
    let conn = database::establish_connection(data_path()?.join("data.sqlite"))?;
    match args.commands {
        Commands::ImportIngredients { path } => import::import_ingredients(conn, path)?,
        Commands::ShoppingList { username } => {
            generate_pdf::generate_and_open_shopping_list(conn, &username)?
        }
    }
    Ok(())
}
