//! Plain text output.

use crate::document::{DocumentBlock, Page};
use crate::render::layout::BULLET;

fn emit(lines: &mut Vec<String>, gap_pending: &mut bool, text: String) {
    if *gap_pending && !lines.is_empty() {
        lines.push(String::new());
    }
    *gap_pending = false;
    lines.push(text);
}

/// Render pages as plain text.
///
/// Blocks are separated by one blank line, list items by none, table rows are
/// tab-separated. Runs of blank paragraphs collapse like in print output.
pub fn render_text(pages: &[Page]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut gap_pending = false;
    let mut in_list = false;

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            gap_pending = true;
        }
        for block in &page.blocks {
            let is_list = matches!(block, DocumentBlock::ListItem { .. });
            if in_list && !is_list {
                gap_pending = true;
            }
            match block {
                DocumentBlock::Heading { text, .. } | DocumentBlock::Paragraph { text, .. } => {
                    if !text.trim().is_empty() {
                        emit(&mut lines, &mut gap_pending, text.clone());
                    }
                    gap_pending = true;
                }
                DocumentBlock::ListItem { text, .. } => {
                    emit(&mut lines, &mut gap_pending, format!("{}{}", BULLET, text));
                }
                DocumentBlock::Table { rows, .. } => {
                    for row in rows {
                        let cells: Vec<&str> = row.iter().map(|cell| cell.text.as_str()).collect();
                        emit(&mut lines, &mut gap_pending, cells.join("\t"));
                    }
                    gap_pending = true;
                }
            }
            in_list = is_list;
        }
    }

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}
