// Copyright 2026 Remi Bernotavicius

use crate::database;
use crate::database::models::NewIngredient;
use crate::error::Result;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::RunQueryDsl as _;
use std::path::Path;

/// Seeds the ingredient reference data from a headerless two-column CSV of
/// (name, measurement_unit) rows. The insert is all-or-nothing; a unique
/// violation means the data was loaded before and is reported as a friendly
/// message instead of a fault.
pub fn import_ingredients(mut conn: database::Connection, path: impl AsRef<Path>) -> Result<()> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;

    let mut rows = vec![];
    for record in reader.deserialize::<NewIngredient>() {
        rows.push(record?);
    }
    if rows.is_empty() {
        println!("imported 0 ingredients");
        return Ok(());
    }

    match insert_into(ingredients).values(rows).execute(&mut conn) {
        Ok(count) => println!("imported {count} ingredients"),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            println!("these ingredients already exist, nothing imported")
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
