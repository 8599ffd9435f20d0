use crate::errors::ExportError;
use crate::models::{ChecklistItem, DayPoint};
use chrono::NaiveDate;
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream,
};
use std::io::Cursor;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::info;

pub const FILE_PREFIX: &str = "care-checklist";

// A4 in points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const PAGE_MARGIN: f32 = 28.0;

const IMAGE_WIDTH: u32 = 800;
const PADDING: u32 = 32;
const HEADER_HEIGHT: u32 = 72;
const PROGRESS_HEIGHT: u32 = 20;
const ROW_HEIGHT: u32 = 36;
const ROW_GAP: u32 = 10;
const BOX_SIZE: u32 = 20;
const CHART_HEIGHT: u32 = 200;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([47, 72, 88]);
const ACCENT: Rgb<u8> = Rgb([255, 107, 74]);
const DONE: Rgb<u8> = Rgb([46, 160, 130]);
const MUTED: Rgb<u8> = Rgb([228, 228, 226]);
const ROW: Rgb<u8> = Rgb([246, 244, 240]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Exporting,
}

/// Re-entrancy guard for exports. At most one [`ExportTicket`] exists at a
/// time; dropping it returns the gate to [`ExportPhase::Idle`].
#[derive(Debug, Clone, Default)]
pub struct ExportGate {
    busy: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct ExportTicket {
    busy: Arc<AtomicBool>,
}

impl ExportGate {
    pub fn try_begin(&self) -> Option<ExportTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn phase(&self) -> ExportPhase {
        if self.busy.load(Ordering::Acquire) {
            ExportPhase::Exporting
        } else {
            ExportPhase::Idle
        }
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Everything the report region shows, copied out of the shared state.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    pub items: Vec<ChecklistItem>,
    pub progress_percent: f64,
    pub days: Vec<DayPoint>,
    pub average_percent: f64,
}

#[derive(Debug)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[tracing::instrument(skip_all, fields(items = snapshot.items.len(), days = snapshot.days.len()))]
pub async fn export_snapshot(
    gate: &ExportGate,
    snapshot: ReportSnapshot,
    today: NaiveDate,
) -> Result<ExportedReport, ExportError> {
    run_export(gate, today, move || {
        let image = rasterize(&snapshot);
        render_pdf(&image)
    })
    .await
}

/// Holds the gate for the whole of `render`, which runs on the blocking pool.
/// The ticket is released on every exit path, panics in `render` included.
async fn run_export<F>(gate: &ExportGate, today: NaiveDate, render: F) -> Result<ExportedReport, ExportError>
where
    F: FnOnce() -> Result<Vec<u8>, ExportError> + Send + 'static,
{
    let _ticket = gate.try_begin().ok_or(ExportError::Busy)?;

    let bytes = tokio::task::spawn_blocking(render).await??;

    let file_name = export_file_name(today);
    info!(file_name = file_name.as_str(), size = bytes.len(), "report exported");
    Ok(ExportedReport { file_name, bytes })
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{FILE_PREFIX}-{}.pdf", date.format("%d-%m-%Y"))
}

pub fn rasterize(snapshot: &ReportSnapshot) -> RgbImage {
    let inner_width = IMAGE_WIDTH - PADDING * 2;
    let rows_top = HEADER_HEIGHT + PADDING + PROGRESS_HEIGHT + PADDING;
    let rows_height = snapshot.items.len() as u32 * (ROW_HEIGHT + ROW_GAP);
    let chart_top = rows_top + rows_height + PADDING;
    let height = chart_top + CHART_HEIGHT + PADDING;

    let mut img = RgbImage::from_pixel(IMAGE_WIDTH, height, WHITE);

    fill_rect(&mut img, 0, 0, IMAGE_WIDTH, HEADER_HEIGHT, INK);

    let progress_top = HEADER_HEIGHT + PADDING;
    fill_rect(&mut img, PADDING, progress_top, inner_width, PROGRESS_HEIGHT, MUTED);
    let filled = scaled(inner_width, snapshot.progress_percent);
    fill_rect(&mut img, PADDING, progress_top, filled, PROGRESS_HEIGHT, ACCENT);

    for (index, item) in snapshot.items.iter().enumerate() {
        let top = rows_top + index as u32 * (ROW_HEIGHT + ROW_GAP);
        fill_rect(&mut img, PADDING, top, inner_width, ROW_HEIGHT, ROW);
        let box_x = PADDING + 12;
        let box_y = top + (ROW_HEIGHT - BOX_SIZE) / 2;
        if item.checked {
            fill_rect(&mut img, box_x, box_y, BOX_SIZE, BOX_SIZE, DONE);
        } else {
            fill_rect(&mut img, box_x, box_y, BOX_SIZE, BOX_SIZE, INK);
            fill_rect(&mut img, box_x + 2, box_y + 2, BOX_SIZE - 4, BOX_SIZE - 4, WHITE);
        }
        // Label placeholder, struck through in a lighter tone once done.
        let label_width = (item.label.chars().count() as u32 * 9).min(inner_width - 80);
        let label_color = if item.checked { MUTED } else { INK };
        fill_rect(&mut img, box_x + BOX_SIZE + 16, top + ROW_HEIGHT / 2 - 3, label_width, 6, label_color);
    }

    draw_chart(&mut img, snapshot, chart_top, inner_width);
    img
}

fn draw_chart(img: &mut RgbImage, snapshot: &ReportSnapshot, top: u32, width: u32) {
    let baseline = top + CHART_HEIGHT;
    fill_rect(img, PADDING, baseline - 1, width, 2, MUTED);

    if !snapshot.days.is_empty() {
        let slot = width / snapshot.days.len() as u32;
        let bar = slot * 3 / 5;
        for (index, day) in snapshot.days.iter().enumerate() {
            let x = PADDING + index as u32 * slot + (slot - bar) / 2;
            let bar_height = scaled(CHART_HEIGHT, f64::from(day.percentage)).max(2);
            let color = if day.total_count == 0 { MUTED } else { DONE };
            fill_rect(img, x, baseline - bar_height, bar, bar_height, color);
        }
    }

    let average = scaled(CHART_HEIGHT, snapshot.average_percent);
    fill_rect(img, PADDING, baseline.saturating_sub(average + 1), width, 2, ACCENT);
}

fn scaled(length: u32, percent: f64) -> u32 {
    (f64::from(length) * percent.clamp(0.0, 100.0) / 100.0).round() as u32
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Scales an image to fit inside the page margins, keeping its aspect
/// ratio, and centres it. Coordinates use the PDF origin (bottom left).
pub fn fit_centered(
    image_width: f32,
    image_height: f32,
    page_width: f32,
    page_height: f32,
    margin: f32,
) -> Placement {
    let available_width = (page_width - margin * 2.0).max(0.0);
    let available_height = (page_height - margin * 2.0).max(0.0);
    if image_width <= 0.0 || image_height <= 0.0 {
        return Placement {
            x: page_width / 2.0,
            y: page_height / 2.0,
            width: 0.0,
            height: 0.0,
        };
    }
    let ratio = (available_width / image_width).min(available_height / image_height);
    let width = image_width * ratio;
    let height = image_height * ratio;
    Placement {
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
    }
}

/// Single A4 page with the image embedded as a JPEG XObject.
pub fn render_pdf(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut jpeg = Vec::new();
    image.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

    let placement = fit_centered(
        image.width() as f32,
        image.height() as f32,
        PAGE_WIDTH,
        PAGE_HEIGHT,
        PAGE_MARGIN,
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width()),
            "Height" => i64::from(image.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::from(placement.width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::from(placement.height),
                    Object::from(placement.x),
                    Object::from(placement.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1i64,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::from(PAGE_WIDTH),
            Object::from(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
