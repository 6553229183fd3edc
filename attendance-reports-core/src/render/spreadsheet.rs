//! Excel output as an XML Spreadsheet 2003 (SpreadsheetML) workbook.
//!
//! Field blocks go to a leading "Summary" worksheet, each table to its own
//! worksheet. Plain decimals (`12`, `-3.5`) are typed `Number`; everything else,
//! including zero-padded identifiers such as roll number `007`, stays `String`.

use std::collections::HashSet;
use std::fmt::Write;

use super::{ReportDocument, Section};

const MAX_SHEET_NAME: usize = 31;

pub fn render_workbook(document: &ReportDocument) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <?mso-application progid=\"Excel.Sheet\"?>\n\
         <Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" \
         xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
    );
    let mut names = HashSet::new();

    let mut summary_rows: Vec<Vec<String>> = vec![vec![document.title.clone()]];
    for section in &document.sections {
        if let Section::Fields(block) = section {
            if let Some(heading) = &block.heading {
                summary_rows.push(vec![heading.clone()]);
            }
            summary_rows.extend(
                block
                    .fields
                    .iter()
                    .map(|(label, value)| vec![label.clone(), value.clone()]),
            );
        }
    }
    worksheet(&mut xml, &unique_sheet_name("Summary", &mut names), &summary_rows);

    for table in document.tables() {
        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        rows.push(table.columns.clone());
        rows.extend(table.rows.iter().cloned());
        worksheet(&mut xml, &unique_sheet_name(&table.heading, &mut names), &rows);
    }

    xml.push_str("</Workbook>\n");
    xml.into_bytes()
}

fn worksheet(xml: &mut String, name: &str, rows: &[Vec<String>]) {
    let _ = writeln!(xml, " <Worksheet ss:Name=\"{}\">\n  <Table>", escape(name));
    for row in rows {
        xml.push_str("   <Row>");
        for cell in row {
            let kind = if is_plain_number(cell) {
                "Number"
            } else {
                "String"
            };
            let _ = write!(
                xml,
                "<Cell><Data ss:Type=\"{kind}\">{}</Data></Cell>",
                escape(cell)
            );
        }
        xml.push_str("</Row>\n");
    }
    xml.push_str("  </Table>\n </Worksheet>\n");
}

/// Optional `-`, digits, optional fraction. Rejects `NaN`, `inf`, exponents
/// and leading zeros so text and identifiers keep their exact spelling.
fn is_plain_number(cell: &str) -> bool {
    let unsigned = cell.strip_prefix('-').unwrap_or(cell);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int)
        && (int == "0" || !int.starts_with('0'))
        && frac.map_or(true, digits)
}

/// Excel rejects `[]:*?/\` in sheet names, names over 31 chars and duplicates.
fn unique_sheet_name(raw: &str, taken: &mut HashSet<String>) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '-' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    let base = if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.len());
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    candidate
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
