//! Format-neutral report document and its serializers.
//!
//! Report builders in [`crate::documents`] produce a [`ReportDocument`]; [`render`]
//! turns it into the bytes of the requested [`ReportFormat`]:
//!   - PDF: paginated A4 pages (see [`pdf`])
//!   - CSV: heading rows followed by the section rows (see [`delimited`])
//!   - Excel: SpreadsheetML workbook, one worksheet per table (see [`spreadsheet`])

pub mod delimited;
pub mod pdf;
pub mod spreadsheet;

use thiserror::Error;
use tracing::debug;

use crate::model::ReportFormat;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document has no sections")]
    Empty,
    #[error("csv output: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("table '{heading}' row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        heading: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Heading followed by `label: value` lines.
    Fields(FieldBlock),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldBlock {
    pub heading: Option<String>,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub heading: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn fields<K, V>(
        mut self,
        heading: Option<&str>,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.sections.push(Section::Fields(FieldBlock {
            heading: heading.map(str::to_string),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }));
        self
    }

    pub fn table(mut self, heading: &str, columns: &[&str], rows: Vec<Vec<String>>) -> Self {
        self.sections.push(Section::Table(Table {
            heading: heading.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }));
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.sections.iter().filter_map(|s| match s {
            Section::Table(t) => Some(t),
            Section::Fields(_) => None,
        })
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.sections.is_empty() {
            return Err(RenderError::Empty);
        }
        for table in self.tables() {
            if let Some((row, cells)) = table
                .rows
                .iter()
                .enumerate()
                .find(|(_, cells)| cells.len() != table.columns.len())
            {
                return Err(RenderError::RaggedTable {
                    heading: table.heading.clone(),
                    row,
                    found: cells.len(),
                    expected: table.columns.len(),
                });
            }
        }
        Ok(())
    }
}

/// Serialize a document into the requested format.
pub fn render(document: &ReportDocument, format: ReportFormat) -> Result<Vec<u8>, RenderError> {
    document.validate()?;
    let bytes = match format {
        ReportFormat::Pdf => pdf::render_pdf(document),
        ReportFormat::Csv => delimited::render_csv(document)?,
        ReportFormat::Excel => spreadsheet::render_workbook(document),
    };
    debug!(%format, size = bytes.len(), title = %document.title, "Rendered report document");
    Ok(bytes)
}
