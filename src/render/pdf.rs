/*!
 * PDF writer.
 *
 * Converts a `Layout` into a PDF using the base-14 Helvetica fonts with
 * WinAnsi encoding. Content streams are written uncompressed.
 */

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::document::Page;
use crate::errors::RenderError;
use crate::render::layout::{layout_pages, Layout, LayoutItem};
use crate::render::RenderConfig;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Map a char to its WinAnsi byte; unsupported characters become `?`.
pub fn winansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => b'?',
    }
}

/// Encode text as WinAnsi bytes.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

fn show_text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, baseline: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), Object::Real(size)]));
    ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_winansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Content stream operations for one output page.
fn page_operations(items: &[LayoutItem], page_height: f32, config: &RenderConfig) -> Vec<Operation> {
    let mut ops = Vec::new();
    // PDF space grows upwards; the baseline sits one font size below the line top
    let to_pdf_y = |y: f32| page_height - y;

    for item in items {
        match item {
            LayoutItem::Text { x, y, text, font_size, bold } => {
                let font = if *bold { BOLD_FONT } else { REGULAR_FONT };
                show_text(&mut ops, font, *font_size, *x, to_pdf_y(*y + font_size), text);
            }
            LayoutItem::TableCell { x, y, width, height, lines, font_size, .. } => {
                ops.push(Operation::new("w", vec![Object::Real(0.5)]));
                ops.push(Operation::new(
                    "re",
                    vec![
                        Object::Real(*x),
                        Object::Real(to_pdf_y(*y + height)),
                        Object::Real(*width),
                        Object::Real(*height),
                    ],
                ));
                ops.push(Operation::new("S", vec![]));

                let line_height = config.line_height(*font_size);
                for (i, line) in lines.iter().enumerate() {
                    let top = *y + config.cell_padding + i as f32 * line_height;
                    show_text(
                        &mut ops,
                        REGULAR_FONT,
                        *font_size,
                        *x + config.cell_padding,
                        to_pdf_y(top + font_size),
                        line,
                    );
                }
            }
        }
    }
    ops
}

fn engine_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Engine {
        format: "pdf",
        message: e.to_string(),
    }
}

/// Write a laid-out document as PDF bytes.
pub fn write_pdf(layout: &Layout, config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let mut page_ids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(&page.items, layout.page_height, config),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(engine_error)?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(layout.page_width),
                Object::Real(layout.page_height),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(engine_error)?;
    Ok(buf)
}

/// Lay out and write translated pages as PDF.
pub fn render_pdf(pages: &[Page], config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    let layout = layout_pages(pages, config)?;
    write_pdf(&layout, config)
}
