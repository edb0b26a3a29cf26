// src/report.rs

//! PDF status report over a batch of link sets.
//!
//! The report is laid out first as a list of [`ReportLine`]s and then drawn
//! onto A4 pages: a title, the generation time and, per set, a bordered
//! URL/status table with the status cell colored by outcome.

use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use crate::error::{AppError, Result};
use crate::models::{LinkSet, LinkStatus, StatusCounts};

/// MIME type of a rendered report.
pub const CONTENT_TYPE: &str = "application/pdf";

const TITLE: &str = "Link status report";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LAYER: &str = "Report";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const URL_COLUMN: f32 = 120.0;
const STATUS_COLUMN: f32 = 50.0;
const ROW_HEIGHT: f32 = 8.0;
const URL_MAX_CHARS: usize = 64;

/// One line of the report, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Title(String),
    Generated(String),
    SetHeader(String),
    TableHeader,
    Row { url: String, status: LinkStatus },
    Summary(String),
    Note(String),
}

/// Attachment name for a report generated at `generated_at`.
pub fn report_filename(generated_at: DateTime<Utc>) -> String {
    format!("report_{}.pdf", generated_at.timestamp())
}

/// Lay out the report for `sets` in the order given.
pub fn report_lines(sets: &[LinkSet], generated_at: DateTime<Utc>) -> Vec<ReportLine> {
    let mut lines = vec![
        ReportLine::Title(TITLE.to_string()),
        ReportLine::Generated(format!("Generated: {}", generated_at.format(TIME_FORMAT))),
    ];

    if sets.is_empty() {
        lines.push(ReportLine::Note("No link sets".to_string()));
        return lines;
    }

    for set in sets {
        lines.push(ReportLine::SetHeader(format!(
            "Set #{} (Created: {})",
            set.id,
            set.created_at.format(TIME_FORMAT)
        )));
        lines.push(ReportLine::TableHeader);
        lines.extend(set.links.iter().map(|link| ReportLine::Row {
            url: link.url.clone(),
            status: link.status,
        }));

        let counts = set.counts();
        lines.push(ReportLine::Summary(format!(
            "Summary: {} available, {} unavailable, {} pending",
            counts.available, counts.unavailable, counts.pending
        )));
    }

    let totals: StatusCounts = sets.iter().collect();
    lines.push(ReportLine::Note(format!(
        "Total: {} sets, {} links ({} available, {} unavailable, {} pending)",
        sets.len(),
        totals.total(),
        totals.available,
        totals.unavailable,
        totals.pending
    )));
    lines
}

/// Render the report for `sets` as a PDF document.
pub fn render_report(sets: &[LinkSet], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut page = PageWriter::new()?;
    for line in report_lines(sets, generated_at) {
        page.draw(&line);
    }
    page.finish()
}

fn status_color(status: LinkStatus) -> Color {
    match status {
        LinkStatus::Available => rgb(0.0, 0.5, 0.0),
        LinkStatus::Unavailable => rgb(1.0, 0.0, 0.0),
        LinkStatus::Pending => rgb(0.5, 0.5, 0.5),
    }
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

fn truncate(url: &str) -> String {
    if url.chars().count() <= URL_MAX_CHARS {
        return url.to_string();
    }
    let head: String = url.chars().take(URL_MAX_CHARS - 3).collect();
    format!("{head}...")
}

/// Draws lines top to bottom, breaking onto a new page when one is full.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Top edge of the next line, in mm from the bottom of the page
    y: f32,
}

impl PageWriter {
    fn new() -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(AppError::report)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(AppError::report)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn draw(&mut self, line: &ReportLine) {
        match line {
            ReportLine::Title(text) => self.text(text, 12.0, true, 12.0),
            ReportLine::Generated(text) => self.text(text, 10.0, false, 16.0),
            ReportLine::SetHeader(text) => self.text(text, 10.0, true, ROW_HEIGHT + 2.0),
            ReportLine::TableHeader => {
                self.reserve(ROW_HEIGHT);
                self.cell(MARGIN, URL_COLUMN, "URL", true, black());
                self.cell(MARGIN + URL_COLUMN, STATUS_COLUMN, "Status", true, black());
                self.y -= ROW_HEIGHT;
            }
            ReportLine::Row { url, status } => {
                self.reserve(ROW_HEIGHT);
                self.cell(MARGIN, URL_COLUMN, &truncate(url), false, black());
                self.cell(
                    MARGIN + URL_COLUMN,
                    STATUS_COLUMN,
                    status.as_str(),
                    false,
                    status_color(*status),
                );
                self.y -= ROW_HEIGHT;
            }
            ReportLine::Summary(text) => self.text(text, 10.0, false, ROW_HEIGHT + 10.0),
            ReportLine::Note(text) => self.text(text, 10.0, false, ROW_HEIGHT),
        }
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(AppError::report)
    }

    /// Start a new page unless `height` mm still fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold { &self.bold } else { &self.regular }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool, height: f32) {
        self.reserve(height);
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.y - ROW_HEIGHT + 2.5), self.font(bold));
        self.y -= height;
    }

    /// Bordered cell of one row height with its top edge at the cursor.
    fn cell(&self, x: f32, width: f32, text: &str, bold: bool, color: Color) {
        let top = self.y;
        let bottom = self.y - ROW_HEIGHT;
        let corner = |x: f32, y: f32| (Point::new(Mm(x), Mm(y)), false);

        self.layer.set_outline_color(black());
        self.layer.set_outline_thickness(0.3);
        self.layer.add_line(Line {
            points: vec![
                corner(x, bottom),
                corner(x + width, bottom),
                corner(x + width, top),
                corner(x, top),
            ],
            is_closed: true,
        });

        self.layer.set_fill_color(color);
        self.layer
            .use_text(text, 10.0, Mm(x + 2.0), Mm(bottom + 2.5), self.font(bold));
        self.layer.set_fill_color(black());
    }
}
