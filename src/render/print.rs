//! Print-time projection: every page fitted onto a fixed-size sheet.

use serde::Serialize;

use crate::constants::BASE_STACK_ORDER;
use crate::geometry::{Rect, Size, fit_contain, to_pixels};
use crate::model::{Document, NoteId, PageId};

/// A note placed on a print sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintNote {
    pub id: NoteId,
    pub rect: Rect,
    pub stack_order: i64,
    pub background: String,
    pub foreground: String,
    pub font_size_px: u32,
    pub bold: bool,
    pub markup: String,
}

/// One page laid out on one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintSheet {
    pub page_id: PageId,
    pub name: String,
    pub sheet: Size,
    /// Where the image sits on the sheet.
    pub image_rect: Rect,
    pub notes: Vec<PrintNote>,
}

/// Lay out every page on its own sheet of size `sheet`.
///
/// The image is fitted and centred; notes use the same normalized rule as
/// the screen, against the print-time image box. Images with unknown size
/// are treated as square.
pub fn project_print(doc: &Document, sheet: Size) -> Vec<PrintSheet> {
    doc.pages()
        .iter()
        .map(|page| {
            let image_rect = fit_contain(sheet, page.dimensions().unwrap_or((1, 1)));
            let notes = page
                .notes
                .iter()
                .map(|note| PrintNote {
                    id: note.id.clone(),
                    rect: to_pixels(&note.geometry(), &image_rect),
                    stack_order: if note.stack_order == 0 {
                        BASE_STACK_ORDER
                    } else {
                        note.stack_order
                    },
                    background: note.style.background_css(),
                    foreground: note.style.foreground.clone(),
                    font_size_px: note.style.font_size_px(),
                    bold: note.style.bold,
                    markup: note.markup.clone(),
                })
                .collect();
            PrintSheet {
                page_id: page.id.clone(),
                name: page.name.clone(),
                sheet,
                image_rect,
                notes,
            }
        })
        .collect()
}
