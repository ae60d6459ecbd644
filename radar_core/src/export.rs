//! Raster capture of the radar view and its PNG/PDF encodings.
//!
//! The capture region mirrors the on-screen view: title, subtitle, the chart
//! in the middle and the category lists on either side. Text is drawn with
//! the 8x8 bitmap font so the output does not depend on system fonts.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use radar_schema::{Category, MarketItem, Rgb};
use thiserror::Error;

use crate::chart::{Point, RadarScene};
use crate::config::RadarConfig;
use crate::lists::{category_list, LEFT_COLUMN, RIGHT_COLUMN};
use crate::store::group_by_category;

/// Logical capture size before scaling (16:9).
pub const CAPTURE_WIDTH: u32 = 1280;
pub const CAPTURE_HEIGHT: u32 = 720;

pub const A4_LANDSCAPE_MM: (f32, f32) = (297.0, 210.0);
const PDF_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

const GLYPH: u32 = 8;
const CHART_TOP: u32 = 130;
const CHART_SIDE: u32 = 560;
const COLUMN_MARGIN: u32 = 24;
const COLUMN_WIDTH: u32 = 316;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    Png,
    Pdf,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Png => "png",
            ExportKind::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Png => f.write_str("PNG"),
            ExportKind::Pdf => f.write_str("PDF"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("capture region is empty ({width}x{height})")]
    EmptyCapture { width: u32, height: u32 },
    #[error("could not encode PNG: {0}")]
    Png(#[from] image::ImageError),
    #[error("could not build PDF: {0}")]
    Pdf(String),
    #[error("export task stopped: {0}")]
    Interrupted(String),
    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Owned copy of everything the capture needs, so it can leave the UI thread.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub title: String,
    pub subtitle: String,
    /// Placed items; unplaced ones are skipped on the chart but still listed.
    pub items: Vec<MarketItem>,
    pub config: Arc<RadarConfig>,
}

/// `"Market Context Radar"` becomes `"market-context-radar"`.
///
/// Path separators and other characters file systems reject are treated like
/// whitespace, so the slug is always a single file name inside the export dir.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for ch in title.chars() {
        if ch.is_whitespace() || is_reserved_in_file_names(ch) {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    slug
}

fn is_reserved_in_file_names(ch: char) -> bool {
    ch.is_control() || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

pub fn export_filename(title: &str, kind: ExportKind) -> String {
    format!("{}.{}", slugify(title), kind.extension())
}

/// Rasterize the capture region at the configured scale.
pub fn capture_region(snapshot: &ExportSnapshot) -> Result<RgbaImage, ExportError> {
    let scale = snapshot.config.export.scale;
    let width = CAPTURE_WIDTH * scale;
    let height = CAPTURE_HEIGHT * scale;
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyCapture { width, height });
    }

    let mut canvas = Canvas::new(width, height, scale, snapshot.config.export.background);
    canvas.header(&snapshot.title, &snapshot.subtitle);
    canvas.chart(&snapshot.items, &snapshot.config);

    let groups = group_by_category(&snapshot.items);
    canvas.column(COLUMN_MARGIN, &LEFT_COLUMN, &groups, &snapshot.config);
    canvas.column(
        CAPTURE_WIDTH - COLUMN_MARGIN - COLUMN_WIDTH,
        &RIGHT_COLUMN,
        &groups,
        &snapshot.config,
    );

    tracing::debug!(
        target: "market_radar::export",
        width,
        height,
        items = snapshot.items.len(),
        "capture.rendered"
    );
    Ok(canvas.into_image())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Rectangle, in millimetres from the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scale an image to fit inside the page minus `margin`, keeping its aspect
/// ratio, and center it in the remaining space.
pub fn fit_within(
    image_width: u32,
    image_height: u32,
    page: (f32, f32),
    margin: f32,
) -> PagePlacement {
    let content_width = page.0 - margin * 2.0;
    let content_height = page.1 - margin * 2.0;
    let ratio = image_width as f32 / image_height.max(1) as f32;

    let mut width = content_width;
    let mut height = width / ratio;
    if height > content_height {
        height = content_height;
        width = height * ratio;
    }

    PagePlacement {
        x: margin + (content_width - width) / 2.0,
        y: margin + (content_height - height) / 2.0,
        width,
        height,
    }
}

/// Single landscape A4 page with the image centered inside the margins.
pub fn encode_pdf(image: &RgbaImage, title: &str, margin_mm: f32) -> Result<Vec<u8>, ExportError> {
    use printpdf::image_crate::{DynamicImage, RgbImage};
    use printpdf::{Image, ImageTransform, Mm, PdfDocument};

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyCapture { width, height });
    }

    let rgb: Vec<u8> = image
        .pixels()
        .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
        .collect();
    let rgb = RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ExportError::Pdf("raster buffer size mismatch".to_string()))?;

    let (page_width, page_height) = A4_LANDSCAPE_MM;
    let placement = fit_within(width, height, A4_LANDSCAPE_MM, margin_mm);
    let native_width = width as f32 / PDF_DPI * MM_PER_INCH;
    let native_height = height as f32 / PDF_DPI * MM_PER_INCH;

    let (document, page, layer) =
        PdfDocument::new(title, Mm(page_width), Mm(page_height), "Capture");
    let layer = document.get_page(page).get_layer(layer);
    Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb)).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(placement.x)),
            // PDF user space starts at the bottom-left corner.
            translate_y: Some(Mm(page_height - placement.y - placement.height)),
            scale_x: Some(placement.width / native_width),
            scale_y: Some(placement.height / native_height),
            dpi: Some(PDF_DPI),
            ..Default::default()
        },
    );

    document
        .save_to_bytes()
        .map_err(|err| ExportError::Pdf(err.to_string()))
}

/// Capture, encode and write one export into `dir`; returns the written path.
pub fn export_to_dir(
    snapshot: &ExportSnapshot,
    kind: ExportKind,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let image = capture_region(snapshot)?;
    let bytes = match kind {
        ExportKind::Png => encode_png(&image)?,
        ExportKind::Pdf => encode_pdf(
            &image,
            &snapshot.title,
            snapshot.config.export.page_margin_mm,
        )?,
    };
    let path = dir.join(export_filename(&snapshot.title, kind));
    fs::write(&path, &bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(
        target: "market_radar::export",
        kind = %kind,
        path = %path.display(),
        bytes = bytes.len(),
        "export.written"
    );
    Ok(path)
}

/// Greedy word wrap; words longer than `max_chars` are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 0xff])
}

/// Scaled drawing surface; all public coordinates are logical pixels.
struct Canvas {
    image: RgbaImage,
    scale: u32,
}

impl Canvas {
    fn new(width: u32, height: u32, scale: u32, background: Rgb) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, rgba(background)),
            scale,
        }
    }

    fn into_image(self) -> RgbaImage {
        self.image
    }

    fn s(&self, value: f64) -> f64 {
        value * f64::from(self.scale)
    }

    fn header(&mut self, title: &str, subtitle: &str) {
        let center = f64::from(CAPTURE_WIDTH) / 2.0;
        self.text_centered(center, 24.0, title, rgba(Rgb::INK), 4);
        let mut y = 80.0;
        for line in wrap_text(subtitle, 96).into_iter().take(2) {
            self.text_centered(center, y, &line, rgba(Rgb::TEXT), 1);
            y += 12.0;
        }
    }

    fn chart(&mut self, items: &[MarketItem], config: &RadarConfig) {
        let origin_x = f64::from((CAPTURE_WIDTH - CHART_SIDE) / 2);
        let origin_y = f64::from(CHART_TOP);
        let scene = RadarScene::build(items, config, f64::from(CHART_SIDE));
        let at = |point: Point| (origin_x + point.x, origin_y + point.y);
        let grid = rgba(Rgb::GRID);

        for axis in &scene.axes {
            let (x1, y1) = at(axis.from);
            let (x2, y2) = at(axis.to);
            self.line(x1, y1, x2, y2, grid, 2.0);
        }
        let (cx, cy) = at(scene.center);
        for ring in &scene.rings {
            self.dashed_circle(cx, cy, ring.radius - 1.0, grid, 2.0);
        }
        for ring in &scene.rings {
            let (x, y) = at(ring.label_at);
            let width = (ring.label.chars().count() as u32 * GLYPH) as f64;
            self.fill_rect(x - width / 2.0 - 10.0, y - 8.0, width + 20.0, 16.0, rgba(Rgb::INK));
            self.text_centered(x, y - 4.0, &ring.label, rgba(Rgb::WHITE), 1);
        }
        for label in &scene.quadrant_labels {
            let (x, y) = at(label.anchor);
            let width = (label.text.chars().count() as u32 * GLYPH * 2) as f64;
            let left = if label.corner.is_right() { x - width } else { x };
            let top = if label.corner.is_bottom() { y - 16.0 } else { y };
            self.text(left, top, &label.text, rgba(label.color), 2);
        }
        for bubble in &scene.bubbles {
            let (x, y) = at(bubble.center);
            self.disc(x, y, bubble.radius, rgba(bubble.color));
            self.text_centered(x, y - 4.0, &bubble.label, rgba(Rgb::WHITE), 1);
        }
    }

    fn column(
        &mut self,
        left: u32,
        categories: &[Category],
        groups: &std::collections::BTreeMap<Category, Vec<MarketItem>>,
        config: &RadarConfig,
    ) {
        let left = f64::from(left);
        let width = f64::from(COLUMN_WIDTH);
        let bottom = f64::from(CAPTURE_HEIGHT) - 16.0;
        let chars_per_line = ((COLUMN_WIDTH - 28) / GLYPH) as usize;
        let mut y = f64::from(CHART_TOP) + 8.0;

        for category in categories {
            let Some(list) = category_list(groups, *category, config) else {
                continue;
            };
            if y + 40.0 > bottom {
                break;
            }
            let color = rgba(list.color);
            self.text(left, y, list.label, color, 2);
            y += 20.0;
            self.fill_rect(left, y, width, 3.0, color);
            y += 10.0;

            for item in list.items {
                let lines = wrap_text(&item.text, chars_per_line);
                let needed = lines.len().max(1) as f64 * 11.0 + 6.0;
                if y + needed > bottom {
                    break;
                }
                self.disc(left + 9.0, y + 8.0, 9.0, color);
                self.text_centered(left + 9.0, y + 4.0, &item.id.to_string(), rgba(Rgb::WHITE), 1);
                let mut line_y = y + 1.0;
                for line in &lines {
                    self.text(left + 26.0, line_y, line, rgba(Rgb::TEXT), 1);
                    line_y += 11.0;
                }
                y += needed.max(22.0);
            }
            y += 18.0;
        }
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0
            && y >= 0
            && (x as u32) < self.image.width()
            && (y as u32) < self.image.height()
        {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
        let (cx, cy, radius) = (self.s(cx), self.s(cy), self.s(radius));
        self.disc_px(cx, cy, radius, color);
    }

    fn disc_px(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
        let r2 = radius * radius;
        let min_x = (cx - radius).floor() as i64;
        let max_x = (cx + radius).ceil() as i64;
        let min_y = (cy - radius).floor() as i64;
        let max_y = (cy + radius).ceil() as i64;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgba<u8>, width: f64) {
        let (x1, y1, x2, y2) = (self.s(x1), self.s(y1), self.s(x2), self.s(y2));
        let radius = (self.s(width) / 2.0).max(0.6);
        let steps = (x2 - x1).hypot(y2 - y1).max(1.0).ceil() as i64;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            self.disc_px(x1 + (x2 - x1) * t, y1 + (y2 - y1) * t, radius, color);
        }
    }

    fn dashed_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>, width: f64) {
        const DASH: f64 = 6.0;
        const GAP: f64 = 4.0;
        let (cx, cy, radius) = (self.s(cx), self.s(cy), self.s(radius));
        let pen = (self.s(width) / 2.0).max(0.6);
        let period = self.s(DASH + GAP);
        let dash = self.s(DASH);
        let circumference = std::f64::consts::TAU * radius;
        let steps = circumference.max(1.0).ceil() as i64;
        for step in 0..steps {
            let arc = step as f64 / steps as f64 * circumference;
            if arc % period >= dash {
                continue;
            }
            let theta = arc / radius.max(1.0);
            self.disc_px(cx + radius * theta.cos(), cy + radius * theta.sin(), pen, color);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba<u8>) {
        let x0 = self.s(x).floor() as i64;
        let y0 = self.s(y).floor() as i64;
        let x1 = self.s(x + width).ceil() as i64;
        let y1 = self.s(y + height).ceil() as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color);
            }
        }
    }

    fn text_centered(&mut self, cx: f64, top: f64, text: &str, color: Rgba<u8>, glyph_scale: u32) {
        let width = (text.chars().count() as u32 * GLYPH * glyph_scale) as f64;
        self.text(cx - width / 2.0, top, text, color, glyph_scale);
    }

    fn text(&mut self, left: f64, top: f64, text: &str, color: Rgba<u8>, glyph_scale: u32) {
        let pixel = i64::from(glyph_scale * self.scale);
        let mut cursor_x = self.s(left).round() as i64;
        let top = self.s(top).round() as i64;
        for ch in text.chars() {
            let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
            if let Some(glyph) = glyph {
                for (row, bits) in glyph.iter().enumerate() {
                    for col in 0..GLYPH as i64 {
                        if (bits >> col) & 1 == 0 {
                            continue;
                        }
                        let px = cursor_x + col * pixel;
                        let py = top + row as i64 * pixel;
                        for dy in 0..pixel {
                            for dx in 0..pixel {
                                self.put(px + dx, py + dy, color);
                            }
                        }
                    }
                }
            }
            cursor_x += GLYPH as i64 * pixel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_schema::{sample_items, Impact, Position};

    fn snapshot(scale: u32) -> ExportSnapshot {
        let mut config = RadarConfig::default();
        config.export.scale = scale;
        let items = sample_items()
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let row = (index % 5) as f64;
                let col = (index / 5) as f64;
                item.with_position(Position::new(10.0 + row * 18.0, 10.0 + col * 18.0))
            })
            .collect();
        ExportSnapshot {
            title: "Market Context Radar".into(),
            subtitle: "Signals worth watching".into(),
            items,
            config: Arc::new(config),
        }
    }

    #[test]
    fn filenames_are_slugified_titles() {
        assert_eq!(
            export_filename("Market Context Radar", ExportKind::Png),
            "market-context-radar.png"
        );
        assert_eq!(
            export_filename("Market Context Radar", ExportKind::Pdf),
            "market-context-radar.pdf"
        );
        assert_eq!(slugify("Q3   Outlook\tDraft"), "q3-outlook-draft");
    }

    #[test]
    fn separators_in_titles_stay_inside_the_export_dir() {
        assert_eq!(slugify("Q3/Q4 Radar"), "q3-q4-radar");
        assert_eq!(slugify("a\\b: c?"), "a-b-c-");
        assert_eq!(export_filename("../x", ExportKind::Png), "..-x.png");

        let dir = tempfile::tempdir().unwrap();
        let mut snapshot = snapshot(1);
        snapshot.title = "Q3/Q4 Radar".into();
        let path = export_to_dir(&snapshot, ExportKind::Png, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("q3-q4-radar.png"));
        assert!(path.is_file());

        snapshot.title = "../escape".into();
        let path = export_to_dir(&snapshot, ExportKind::Png, dir.path()).unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[test]
    fn fit_keeps_aspect_ratio_and_centers() {
        let placed = fit_within(1280, 720, A4_LANDSCAPE_MM, 15.0);
        assert!((placed.width - 267.0).abs() < 1e-3);
        assert!((placed.height - 267.0 * 720.0 / 1280.0).abs() < 1e-3);
        assert!((placed.x - 15.0).abs() < 1e-3);
        let vertical_gap = 210.0 - placed.height - placed.y;
        assert!((vertical_gap - placed.y).abs() < 1e-3);

        let tall = fit_within(500, 1000, A4_LANDSCAPE_MM, 15.0);
        assert!((tall.height - 180.0).abs() < 1e-3);
        assert!((tall.width - 90.0).abs() < 1e-3);
        assert!((tall.x - (15.0 + (267.0 - 90.0) / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn capture_paints_bubbles_in_category_color() {
        let snapshot = snapshot(1);
        let image = capture_region(&snapshot).unwrap();
        assert_eq!(image.dimensions(), (CAPTURE_WIDTH, CAPTURE_HEIGHT));

        // Sample the rim of the first bubble, away from its white id label.
        let first = &snapshot.items[0];
        let position = first.position.unwrap();
        let side = f64::from(CHART_SIDE);
        let radius = snapshot.config.bubble_radius * side;
        let x = f64::from((CAPTURE_WIDTH - CHART_SIDE) / 2) + position.left.value() / 100.0 * side;
        let y = f64::from(CHART_TOP) + position.top.value() / 100.0 * side + radius * 0.8;
        let pixel = image.get_pixel(x as u32, y as u32);
        let expected = snapshot.config.category(first.category).color;
        assert_eq!(*pixel, rgba(expected));
        assert_eq!(*image.get_pixel(2, 2), rgba(Rgb::WHITE));
    }

    #[test]
    fn png_and_pdf_encodings_have_expected_headers() {
        let snapshot = snapshot(1);
        let image = capture_region(&snapshot).unwrap();

        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), image.dimensions());

        let pdf = encode_pdf(&image, &snapshot.title, 15.0).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn export_scale_multiplies_capture_size() {
        let image = capture_region(&snapshot(2)).unwrap();
        assert_eq!(image.dimensions(), (CAPTURE_WIDTH * 2, CAPTURE_HEIGHT * 2));
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("Generative AI is beginning to automate tasks", 12);
        assert!(lines.iter().all(|line| line.chars().count() <= 12));
        assert_eq!(lines.join(" "), "Generative AI is beginning to automate tasks");
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn unplaced_items_are_still_listed_without_panicking() {
        let mut snapshot = snapshot(1);
        snapshot.items = vec![MarketItem::new(1, "x", Category::Macro, Impact::Near)];
        capture_region(&snapshot).unwrap();
    }
}
