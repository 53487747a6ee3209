//! PDF report export
//!
//! Landscape A4 pages holding, in order: the title and dataset metadata,
//! every chart (or a note when it could not be drawn), the summary averages
//! and the first [`MAX_TABLE_ROWS`] rows of the table. Content flows onto new
//! pages as needed. Text uses the standard Helvetica fonts, so anything
//! outside printable ASCII is replaced.

use crate::charts::RenderedChart;
use crate::error::Result;
use chemviz_common::{Summary, Table};
use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

pub const REPORT_TITLE: &str = "Chemical Equipment Parameter Visualizer - Report";

/// Rows beyond this are left out of the table.
pub const MAX_TABLE_ROWS: usize = 200;

const PAGE_WIDTH: i64 = 842;
const PAGE_HEIGHT: i64 = 595;
const MARGIN: i64 = 36;

const CHART_WIDTH: i64 = 360;
const CHART_HEIGHT: i64 = 225;

const BODY_SIZE: i64 = 10;
const TABLE_SIZE: i64 = 7;

/// Everything a report is made of
#[derive(Debug)]
pub struct ReportInput<'a> {
    pub file_name: &'a str,
    pub generated_at: NaiveDateTime,
    /// Filtered view, or the full table when no filter is active
    pub table: &'a Table,
    pub charts: &'a [RenderedChart],
    /// Stored summary of the dataset
    pub summary: &'a Summary,
}

/// `Average Flowrate: x, Pressure: y, Temperature: z`, `-` when absent.
pub fn summary_line(summary: &Summary) -> String {
    let fmt = |key: &str| {
        summary
            .average(key)
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string())
    };
    format!(
        "Average Flowrate: {}, Pressure: {}, Temperature: {}",
        fmt("flowrate_avg"),
        fmt("pressure_avg"),
        fmt("temperature_avg")
    )
}

/// Build the report and save it to `path`.
pub fn write_report(input: &ReportInput<'_>, path: &Path) -> Result<()> {
    let mut doc = build(input)?;
    doc.save(path)?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(())
}

/// Build the report document.
pub fn build(input: &ReportInput<'_>) -> Result<Document> {
    let mut writer = PdfWriter::new();

    writer.text_line(REPORT_TITLE, Font::Bold, 16);
    writer.text_line(&format!("Dataset: {}", input.file_name), Font::Regular, BODY_SIZE);
    writer.text_line(
        &format!("Generated: {}", input.generated_at.format("%Y-%m-%d %H:%M:%S")),
        Font::Regular,
        BODY_SIZE,
    );
    writer.gap(8);

    for chart in input.charts {
        match &chart.outcome {
            Ok(img) => {
                writer.ensure_space(CHART_HEIGHT + 20)?;
                writer.text_line(chart.title, Font::Bold, 12);
                writer.image(img)?;
            },
            Err(e) => {
                writer.text_line(chart.title, Font::Bold, 12);
                writer.text_line(&format!("Chart unavailable: {}", e), Font::Regular, BODY_SIZE);
            },
        }
        writer.gap(6);
    }

    writer.text_line("Summary", Font::Bold, 12);
    writer.text_line(&summary_line(input.summary), Font::Regular, BODY_SIZE);
    writer.gap(8);

    let shown = input.table.head(MAX_TABLE_ROWS);
    writer.text_line(&format!("Table (first {} rows)", shown.len()), Font::Bold, 12);
    writer.table(&shown);

    writer.finish()
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Cursor-based page builder
struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    fonts_id: ObjectId,
    pages: Vec<ObjectId>,
    ops: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
    /// Distance from the bottom edge of the next line's top
    cursor: i64,
}

impl PdfWriter {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let fonts_id = doc.add_object(dictionary! {
            "F1" => regular,
            "F2" => bold,
        });

        Self {
            doc,
            pages_id,
            fonts_id,
            pages: Vec::new(),
            ops: Vec::new(),
            images: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn gap(&mut self, points: i64) {
        self.cursor -= points;
    }

    /// Start a new page unless `height` points still fit on this one.
    fn ensure_space(&mut self, height: i64) -> Result<()> {
        if self.cursor - height < MARGIN {
            self.flush_page()?;
        }
        Ok(())
    }

    fn text_at(&mut self, x: i64, y: i64, text: &str, font: Font, size: i64) {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(sanitize(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn text_line(&mut self, text: &str, font: Font, size: i64) {
        let height = size + size / 2;
        if self.cursor - height < MARGIN {
            // A failed flush leaves the line on the current page.
            if let Err(e) = self.flush_page() {
                tracing::warn!(error = %e, "Could not start a new report page");
            }
        }
        self.cursor -= height;
        self.text_at(MARGIN, self.cursor + size / 4, text, font, size);
    }

    fn image(&mut self, img: &image::RgbImage) -> Result<()> {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(img.width()),
                "Height" => i64::from(img.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            img.as_raw().clone(),
        );
        let image_id = self.doc.add_object(stream);
        let name = format!("Im{}", self.images.len() + 1);

        self.ensure_space(CHART_HEIGHT)?;
        self.cursor -= CHART_HEIGHT;
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    CHART_WIDTH.into(),
                    0.into(),
                    0.into(),
                    CHART_HEIGHT.into(),
                    MARGIN.into(),
                    self.cursor.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push((name, image_id));
        Ok(())
    }

    fn table(&mut self, table: &Table) {
        let columns = table.width().max(1) as i64;
        let column_width = (PAGE_WIDTH - 2 * MARGIN) / columns;
        // Helvetica averages about half the font size per character.
        let max_chars = ((column_width * 2) / TABLE_SIZE - 1).max(1) as usize;

        let header: Vec<String> = table.columns().to_vec();
        self.table_row(&header, column_width, max_chars, Font::Bold);
        for row in table.rows() {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            self.table_row(&cells, column_width, max_chars, Font::Regular);
        }
    }

    fn table_row(&mut self, cells: &[String], column_width: i64, max_chars: usize, font: Font) {
        let height = TABLE_SIZE + 4;
        if self.cursor - height < MARGIN {
            if let Err(e) = self.flush_page() {
                tracing::warn!(error = %e, "Could not start a new report page");
            }
        }
        self.cursor -= height;
        let y = self.cursor + 2;
        for (i, cell) in cells.iter().enumerate() {
            let text: String = cell.chars().take(max_chars).collect();
            self.text_at(MARGIN + i as i64 * column_width, y, &text, font, TABLE_SIZE);
        }
    }

    /// Close the current page and start an empty one.
    fn flush_page(&mut self) -> Result<()> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut xobjects = lopdf::Dictionary::new();
        for (name, id) in self.images.drain(..) {
            xobjects.set(name, id);
        }
        let resources = dictionary! {
            "Font" => self.fonts_id,
            "XObject" => xobjects,
        };

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.pages.push(page_id);
        self.cursor = PAGE_HEIGHT - MARGIN;
        Ok(())
    }

    fn finish(mut self) -> Result<Document> {
        self.flush_page()?;

        let kids: Vec<Object> = self.pages.iter().map(|id| (*id).into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.pages.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        Ok(self.doc)
    }
}

/// Printable ASCII only; everything else becomes `?`.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}
