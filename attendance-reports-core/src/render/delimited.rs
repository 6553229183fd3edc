//! CSV output. Sections are separated by a blank record and start with a
//! one-cell heading row; field blocks become `label,value` rows and tables a
//! header row followed by data rows.

use csv::WriterBuilder;

use super::{RenderError, ReportDocument, Section};

pub fn render_csv(document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    writer.write_record([document.title.as_str()])?;
    for section in &document.sections {
        // Blank separator record, written past the csv buffer after a flush.
        writer.flush()?;
        let mut buf = writer
            .into_inner()
            .map_err(|e| RenderError::Io(e.into_error()))?;
        buf.push(b'\n');
        writer = WriterBuilder::new().flexible(true).from_writer(buf);
        match section {
            Section::Fields(block) => {
                if let Some(heading) = &block.heading {
                    writer.write_record([heading.as_str()])?;
                }
                for (label, value) in &block.fields {
                    writer.write_record([label.as_str(), value.as_str()])?;
                }
            }
            Section::Table(table) => {
                writer.write_record([table.heading.as_str()])?;
                writer.write_record(&table.columns)?;
                for row in &table.rows {
                    writer.write_record(row)?;
                }
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_written_in_order_with_quoting() {
        let doc = ReportDocument::new("Attendance Report")
            .fields(Some("Summary"), [("Total Classes", "2")])
            .table(
                "Records",
                &["Date", "Notes"],
                vec![
                    vec!["3/2/2024".into(), "came late, left early".into()],
                    vec!["3/1/2024".into(), String::new()],
                ],
            );

        let text = String::from_utf8(render_csv(&doc).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Attendance Report",
                "",
                "Summary",
                "Total Classes,2",
                "",
                "Records",
                "Date,Notes",
                "3/2/2024,\"came late, left early\"",
                "3/1/2024,",
            ]
        );
    }
}
