//! PDF output via `printpdf`, using the built-in Helvetica faces so no font files
//! are needed at runtime.
//!
//! Layout is a single top-to-bottom flow on A4 portrait pages. When the next line
//! would cross the bottom margin a new page is started; a table that continues on
//! a new page repeats its header row.

use printpdf::{BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem};
use tracing::{debug, warn};

use super::{FieldBlock, ReportDocument, Section, Table};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

const TITLE_SIZE: f32 = 22.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const TABLE_SIZE: f32 = 10.0;

const MM_PER_PT: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

/// Render the document into PDF bytes.
pub fn render_pdf(document: &ReportDocument) -> Vec<u8> {
    let pages: Vec<PdfPage> = layout(document)
        .into_iter()
        .map(|ops| PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops))
        .collect();
    debug!(pages = pages.len(), title = %document.title, "Laid out PDF pages");

    let mut warnings = Vec::new();
    let bytes = PdfDocument::new(&document.title)
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "PDF serializer reported warnings");
    }
    bytes
}

/// Lay the document out into per-page drawing operations.
pub(crate) fn layout(document: &ReportDocument) -> Vec<Vec<Op>> {
    let mut cursor = PageCursor::new();

    cursor.line(MARGIN_MM, &document.title, TITLE_SIZE, BuiltinFont::HelveticaBold);
    cursor.gap(4.0);

    for section in &document.sections {
        match section {
            Section::Fields(block) => cursor.fields(block),
            Section::Table(table) => cursor.table(table),
        }
        cursor.gap(6.0);
    }

    cursor.finish()
}

struct PageCursor {
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    /// Baseline of the next line, in mm from the bottom edge.
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn line_height(size: f32) -> f32 {
        size * MM_PER_PT * 1.6
    }

    fn fits(&self, size: f32) -> bool {
        self.y - Self::line_height(size) >= MARGIN_MM
    }

    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.ops);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    /// Write one line at `x`, breaking the page first when needed.
    fn line(&mut self, x: f32, text: &str, size: f32, font: BuiltinFont) {
        if !self.fits(size) {
            self.new_page();
        }
        self.y -= Self::line_height(size);
        self.text_at(x, self.y, text, size, font);
    }

    fn text_at(&mut self, x: f32, y: f32, text: &str, size: f32, font: BuiltinFont) {
        self.ops.extend([
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point {
                    x: Mm(x).into(),
                    y: Mm(y).into(),
                },
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font,
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(pdf_safe(text))],
                font,
            },
            Op::EndTextSection,
        ]);
    }

    fn fields(&mut self, block: &FieldBlock) {
        let mut indent = MARGIN_MM;
        if let Some(heading) = &block.heading {
            self.line(MARGIN_MM, heading, HEADING_SIZE, BuiltinFont::HelveticaBold);
            indent += 10.0;
        }
        for (label, value) in &block.fields {
            self.line(
                indent,
                &format!("{label}: {value}"),
                BODY_SIZE,
                BuiltinFont::Helvetica,
            );
        }
    }

    fn table(&mut self, table: &Table) {
        // Keep the heading with at least the header row and one data row.
        if self.y - Self::line_height(HEADING_SIZE) - 2.0 * Self::line_height(TABLE_SIZE)
            < MARGIN_MM
        {
            self.new_page();
        }
        self.line(MARGIN_MM, &table.heading, HEADING_SIZE, BuiltinFont::HelveticaBold);

        let widths = column_widths(table);
        self.row(&table.columns, &widths, BuiltinFont::HelveticaBold);
        for cells in &table.rows {
            if !self.fits(TABLE_SIZE) {
                self.new_page();
                self.row(&table.columns, &widths, BuiltinFont::HelveticaBold);
            }
            self.row(cells, &widths, BuiltinFont::Helvetica);
        }
    }

    fn row(&mut self, cells: &[String], widths: &[f32], font: BuiltinFont) {
        if !self.fits(TABLE_SIZE) {
            self.new_page();
        }
        self.y -= Self::line_height(TABLE_SIZE);
        let y = self.y;
        let mut x = MARGIN_MM;
        for (cell, width) in cells.iter().zip(widths) {
            let text = truncate_to_width(cell, *width, TABLE_SIZE);
            self.text_at(x, y, &text, TABLE_SIZE, font);
            x += width;
        }
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

/// Split the printable width across columns in proportion to their longest cell.
fn column_widths(table: &Table) -> Vec<f32> {
    let available = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let weights: Vec<f32> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let longest = table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(1);
            longest.clamp(4, 40) as f32
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.iter().map(|w| available * w / total).collect()
}

fn truncate_to_width(text: &str, width_mm: f32, size: f32) -> String {
    let glyph_mm = size * AVG_GLYPH_EM * MM_PER_PT;
    // Leave one glyph of padding between columns.
    let max_chars = ((width_mm / glyph_mm) as usize).saturating_sub(1).max(1);
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars.saturating_sub(2).max(1)).collect();
    shortened.push_str("..");
    shortened
}

/// The built-in fonts only cover Latin-1; anything else is replaced.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF && !c.is_control() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_table_document(rows: usize) -> ReportDocument {
        ReportDocument::new("Long").table(
            "Attendance Records",
            &["Date", "Status", "Notes"],
            (0..rows)
                .map(|i| vec![format!("3/{}/2024", i % 28 + 1), "present".into(), String::new()])
                .collect(),
        )
    }

    #[test]
    fn short_document_fits_on_one_page() {
        assert_eq!(layout(&long_table_document(5)).len(), 1);
    }

    #[test]
    fn long_table_continues_on_new_pages() {
        let pages = layout(&long_table_document(200));
        assert!(pages.len() >= 3, "expected pagination, got {} page(s)", pages.len());
        assert!(pages.iter().all(|ops| !ops.is_empty()));
    }

    #[test]
    fn output_has_pdf_magic_header() {
        let bytes = render_pdf(&long_table_document(3));
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn overlong_cells_are_shortened() {
        let text = "x".repeat(200);
        let shortened = truncate_to_width(&text, 30.0, TABLE_SIZE);
        assert!(shortened.ends_with(".."));
        assert!(shortened.chars().count() < 200);
    }

    #[test]
    fn non_latin1_characters_are_replaced() {
        assert_eq!(pdf_safe("José ✓"), "José ?");
    }
}
