use chrono::NaiveDate;
use tracing::debug;

use super::metrics::wrap_text;
use super::watermark::{Watermark, WatermarkOutcome};
use crate::report::style::{self, Align, Font, Rgb};
use crate::report::{
    Block, Narrative, ReportDocument, RowKind, Section, SignatureBlock, Table, TextLine,
};

/// Replaced by the page count once every page is laid out
pub const PAGE_TOTAL_ALIAS: &str = "{nb}";

const HEADING_HEIGHT: f32 = 8.0;
const RUNNING_HEADER_HEIGHT: f32 = 6.0;
const RUNNING_HEADER_GAP: f32 = 2.0;
const FOOTER_HEIGHT: f32 = 10.0;
const EPSILON: f32 = 0.01;

/// Physical page in millimetres
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub margin_top: f32,
    /// Distance from the bottom edge where content stops
    pub break_margin: f32,
    /// Distance from the bottom edge where the footer starts
    pub footer_offset: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin_x: 15.0,
            margin_top: 15.0,
            break_margin: 20.0,
            footer_offset: 15.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }

    pub fn bottom_limit(&self) -> f32 {
        self.height - self.break_margin
    }

    /// Left edge of a block of `width` centered in the printable width
    pub fn centered_x(&self, width: f32) -> f32 {
        self.margin_x + (self.content_width() - width) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub geometry: PageGeometry,
    /// Watermark width as a fraction of the page width
    pub watermark_scale: f32,
    pub generated_on: Option<NaiveDate>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::a4(),
            watermark_scale: 0.6,
            generated_on: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
    pub align: Align,
    pub font: Font,
    pub color: Rgb,
    pub fill: Option<Rgb>,
    pub border: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub color: Rgb,
    pub thickness: f32,
}

/// Something drawn at an absolute position on a page
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Watermark(ImageBox),
    Cell(CellBox),
    Rule(Rule),
}

impl Primitive {
    fn shifted(mut self, dy: f32) -> Self {
        match &mut self {
            Primitive::Watermark(image) => image.y += dy,
            Primitive::Cell(cell) => cell.y += dy,
            Primitive::Rule(rule) => {
                rule.y1 += dy;
                rule.y2 += dy;
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    /// Drawn in order; later primitives paint over earlier ones
    pub primitives: Vec<Primitive>,
}

impl Page {
    pub fn cells(&self) -> impl Iterator<Item = &CellBox> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Cell(cell) => Some(cell),
            _ => None,
        })
    }
}

/// A fully laid-out document, ready to be serialized
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub title: String,
    pub author: Option<String>,
    pub generated_on: Option<NaiveDate>,
    pub geometry: PageGeometry,
    pub watermark: Option<Watermark>,
    pub pages: Vec<Page>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A horizontal slice of a section that is never split across pages
struct Band {
    height: f32,
    /// Positioned relative to the top of the band
    primitives: Vec<Primitive>,
    keep_with_next: bool,
    spacer: bool,
}

impl Band {
    fn new(height: f32, primitives: Vec<Primitive>) -> Self {
        Self {
            height,
            primitives,
            keep_with_next: false,
            spacer: false,
        }
    }
}

/// Lay the report out on pages: pagination, running header and footer,
/// watermark, and the page total resolved in a final pass.
pub fn render(
    report: &ReportDocument,
    watermark: &WatermarkOutcome,
    options: &RenderOptions,
) -> RenderedDocument {
    let geometry = options.geometry;
    let image = watermark
        .applied()
        .map(|w| watermark_box(w, &geometry, options.watermark_scale));

    let mut layout = Layout {
        geometry,
        running_header: &report.running_header,
        watermark: image,
        pages: Vec::new(),
        footers: Vec::new(),
        y: 0.0,
        top: 0.0,
    };
    layout.start_page();

    for section in &report.sections {
        layout.place_section(section_bands(section, &geometry));
    }

    let mut pages = layout.pages;
    resolve_page_total(&mut pages, &layout.footers);
    debug!(pages = pages.len(), "Laid out statement");

    RenderedDocument {
        title: report.title.clone(),
        author: report.author.clone(),
        generated_on: options.generated_on,
        geometry,
        watermark: watermark.applied().cloned(),
        pages,
    }
}

/// Scaled to a fraction of the page width, aspect kept, centered both ways
fn watermark_box(watermark: &Watermark, geometry: &PageGeometry, scale: f32) -> ImageBox {
    let width = geometry.width * scale;
    let height = width * watermark.aspect_ratio();
    ImageBox {
        x: (geometry.width - width) / 2.0,
        y: (geometry.height - height) / 2.0,
        width,
        height,
        opacity: watermark.opacity,
    }
}

/// `footers[i]` is the index of page i's footer among its primitives; user
/// text elsewhere on the page is left alone even if it contains the alias.
fn resolve_page_total(pages: &mut [Page], footers: &[usize]) {
    let total = pages.len().to_string();
    for (page, &footer) in pages.iter_mut().zip(footers) {
        if let Some(Primitive::Cell(cell)) = page.primitives.get_mut(footer) {
            cell.text = cell.text.replace(PAGE_TOTAL_ALIAS, &total);
        }
    }
}

struct Layout<'a> {
    geometry: PageGeometry,
    running_header: &'a str,
    watermark: Option<ImageBox>,
    pages: Vec<Page>,
    /// Index of each page's footer cell in its primitives
    footers: Vec<usize>,
    y: f32,
    /// Where content starts on the current page
    top: f32,
}

impl Layout<'_> {
    fn start_page(&mut self) {
        let number = self.pages.len() + 1;
        let g = self.geometry;
        let mut primitives = Vec::new();

        if let Some(image) = &self.watermark {
            primitives.push(Primitive::Watermark(image.clone()));
        }

        let mut top = g.margin_top;
        if number > 1 {
            primitives.push(Primitive::Cell(CellBox {
                x: g.margin_x,
                y: g.margin_top,
                width: g.content_width(),
                height: RUNNING_HEADER_HEIGHT,
                text: self.running_header.to_string(),
                align: Align::Center,
                font: Font::bold(10.0),
                color: style::BLUE,
                fill: None,
                border: None,
            }));
            top += RUNNING_HEADER_HEIGHT + RUNNING_HEADER_GAP;
        }

        self.footers.push(primitives.len());
        primitives.push(Primitive::Cell(CellBox {
            x: g.margin_x,
            y: g.height - g.footer_offset,
            width: g.content_width(),
            height: FOOTER_HEIGHT,
            text: format!("Página {number}/{PAGE_TOTAL_ALIAS}"),
            align: Align::Center,
            font: Font::italic(9.0),
            color: style::MUTED,
            fill: None,
            border: None,
        }));

        debug!(page = number, "Starting page");
        self.pages.push(Page { number, primitives });
        self.top = top;
        self.y = top;
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.bottom_limit() + EPSILON
    }

    fn at_page_top(&self) -> bool {
        (self.y - self.top).abs() < EPSILON
    }

    /// Room on a page that carries the running header
    fn fresh_page_capacity(&self) -> f32 {
        self.geometry.bottom_limit()
            - self.geometry.margin_top
            - RUNNING_HEADER_HEIGHT
            - RUNNING_HEADER_GAP
    }

    fn place_section(&mut self, bands: Vec<Band>) {
        let total: f32 = bands.iter().map(|b| b.height).sum();

        // Move the whole section to a new page when it fits there but not here
        if !self.fits(total) && !self.at_page_top() && total <= self.fresh_page_capacity() {
            self.start_page();
        }

        for (index, band) in bands.iter().enumerate() {
            if band.spacer && self.at_page_top() {
                continue;
            }

            let needed = match bands.get(index + 1) {
                Some(next) if band.keep_with_next => band.height + next.height,
                _ => band.height,
            };
            if !self.fits(needed) && !self.at_page_top() {
                if band.spacer {
                    continue;
                }
                self.start_page();
            }

            self.place(band);
        }
    }

    fn place(&mut self, band: &Band) {
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.primitives
                .extend(band.primitives.iter().cloned().map(|p| p.shifted(y)));
        }
        self.y += band.height;
    }
}

fn section_bands(section: &Section, geometry: &PageGeometry) -> Vec<Band> {
    let mut bands = Vec::new();

    if let Some(heading) = &section.heading {
        let mut band = Band::new(
            HEADING_HEIGHT,
            vec![Primitive::Cell(CellBox {
                x: geometry.margin_x,
                y: 0.0,
                width: geometry.content_width(),
                height: HEADING_HEIGHT,
                text: heading.clone(),
                align: Align::Left,
                font: Font::bold(12.0),
                color: style::BLUE,
                fill: None,
                border: None,
            })],
        );
        band.keep_with_next = true;
        bands.push(band);
    }

    for block in &section.blocks {
        match block {
            Block::Text(line) => bands.push(text_band(line, geometry)),
            Block::Table(table) => bands.extend(table_bands(table, geometry)),
            Block::Narrative(narrative) => bands.extend(narrative_bands(narrative, geometry)),
            Block::Signature(signature) => bands.push(signature_band(signature, geometry)),
            Block::Space(height) => {
                let mut band = Band::new(*height, Vec::new());
                band.spacer = true;
                bands.push(band);
            }
        }
    }

    bands
}

fn text_band(line: &TextLine, geometry: &PageGeometry) -> Band {
    Band::new(
        line.height,
        vec![Primitive::Cell(CellBox {
            x: geometry.margin_x,
            y: 0.0,
            width: geometry.content_width(),
            height: line.height,
            text: line.text.clone(),
            align: line.align,
            font: line.font,
            color: line.color,
            fill: None,
            border: None,
        })],
    )
}

/// One band per row; the header row stays with the first data row
fn table_bands(table: &Table, geometry: &PageGeometry) -> Vec<Band> {
    let left = geometry.centered_x(table.width());

    table
        .rows
        .iter()
        .map(|row| {
            let mut x = left;
            let mut column = 0;
            let mut primitives = Vec::with_capacity(row.cells.len());

            for cell in &row.cells {
                let end = (column + cell.span).min(table.columns.len());
                let width: f32 = table.columns[column..end].iter().sum();
                primitives.push(Primitive::Cell(CellBox {
                    x,
                    y: 0.0,
                    width,
                    height: row.height,
                    text: cell.text.clone(),
                    align: cell.align,
                    font: cell.font,
                    color: cell.color,
                    fill: Some(row.fill),
                    border: Some(style::BORDER),
                }));
                x += width;
                column = end;
            }

            let mut band = Band::new(row.height, primitives);
            band.keep_with_next = row.kind == RowKind::Header;
            band
        })
        .collect()
}

fn narrative_bands(narrative: &Narrative, geometry: &PageGeometry) -> Vec<Band> {
    let left = geometry.centered_x(narrative.width);
    // cells are padded by 1mm on each side
    let lines = wrap_text(&narrative.text, narrative.width - 2.0, narrative.font);

    lines
        .into_iter()
        .map(|line| {
            Band::new(
                narrative.line_height,
                vec![Primitive::Cell(CellBox {
                    x: left,
                    y: 0.0,
                    width: narrative.width,
                    height: narrative.line_height,
                    text: line,
                    align: Align::Left,
                    font: narrative.font,
                    color: narrative.color,
                    fill: None,
                    border: None,
                })],
            )
        })
        .collect()
}

fn signature_band(signature: &SignatureBlock, geometry: &PageGeometry) -> Band {
    const LINE_OFFSET: f32 = 18.0;
    let left = geometry.centered_x(signature.line_width);

    let primitives = vec![
        Primitive::Rule(Rule {
            x1: left,
            y1: LINE_OFFSET,
            x2: left + signature.line_width,
            y2: LINE_OFFSET,
            color: style::BLACK,
            thickness: 0.3,
        }),
        Primitive::Cell(CellBox {
            x: geometry.margin_x,
            y: LINE_OFFSET + 1.0,
            width: geometry.content_width(),
            height: 6.0,
            text: signature.name.clone(),
            align: Align::Center,
            font: Font::bold(10.0),
            color: style::BLACK,
            fill: None,
            border: None,
        }),
        Primitive::Cell(CellBox {
            x: geometry.margin_x,
            y: LINE_OFFSET + 7.0,
            width: geometry.content_width(),
            height: 5.0,
            text: signature.caption.clone(),
            align: Align::Center,
            font: Font::regular(9.0),
            color: style::MUTED,
            fill: None,
            border: None,
        }),
    ];

    Band::new(LINE_OFFSET + 12.0, primitives)
}
