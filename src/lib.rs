// Copyright 2026 Remi Bernotavicius

use std::path::PathBuf;

pub mod authoring;
pub mod database;
pub mod error;
pub mod favorites;
pub mod follows;
pub mod generate_pdf;
pub mod import;
pub mod projection;
pub mod query;
pub mod users;

/// This is where the database and other user-data lives on-disk. On Linux it
/// should be like: `~/.local/share/recipe_share/`
pub fn data_path() -> error::Result<PathBuf> {
    let dirs = directories::BaseDirs::new().expect("failed to get user home directory");
    let path = dirs.data_dir().join("recipe_share");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}
