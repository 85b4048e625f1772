use crate::database;
use crate::error::{Error, Result};
use crate::query::{self, CartLine};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fmt;

pub const SHOPPING_LIST_FILENAME: &str = "ingredients.pdf";
pub const SHOPPING_LIST_MIME: &str = "application/pdf";

fn render_err(e: impl fmt::Display) -> Error {
    Error::Render(e.to_string())
}

/// Value for the Content-Disposition header the gateway attaches to the
/// document response.
pub fn shopping_list_disposition() -> String {
    format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\"")
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LINES_PER_PAGE: usize = 25;
const LINE_STEP: f32 = 9.0;

impl fmt::Display for CartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.measurement_unit, self.total)
    }
}

/// Numbered text lines chunked into pages, so a long cart keeps breaking
/// onto fresh pages instead of running off the bottom of the first one.
fn paginate(lines: &[CartLine]) -> Vec<Vec<String>> {
    let numbered: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect();
    numbered
        .chunks(LINES_PER_PAGE)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Renders the aggregated shopping list into a PDF document.
pub fn shopping_list_document(lines: &[CartLine]) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Shopping list", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "text");
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text("Shopping list", 16.0, Mm(20.0), Mm(277.0), &bold);

    let mut first = true;
    for page_lines in paginate(lines) {
        if !first {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "text");
            layer = doc.get_page(page).get_layer(page_layer);
        }
        let mut y = if first { 265.0 } else { 277.0 };
        for line in &page_lines {
            layer.use_text(line.clone(), 12.0, Mm(20.0), Mm(y), &regular);
            y -= LINE_STEP;
        }
        first = false;
    }

    doc.save_to_bytes().map_err(render_err)
}

/// Aggregates the user's cart, renders it and opens the resulting file.
pub fn generate_and_open_shopping_list(
    mut conn: database::Connection,
    username: &str,
) -> Result<()> {
    let user = query::find_user_by_username(&mut conn, username)?;
    let lines = query::sum_cart_ingredients(&mut conn, user.id)?;
    log::info!(
        "rendering shopping list for {username:?}: {} ingredient groups",
        lines.len()
    );
    let bytes = shopping_list_document(&lines)?;

    let lists_dir = crate::data_path()?.join("shopping-lists");
    std::fs::create_dir_all(&lists_dir)?;
    let list_path = lists_dir.join(SHOPPING_LIST_FILENAME);
    std::fs::write(&list_path, bytes)?;
    open::that(list_path)?;
    Ok(())
}
