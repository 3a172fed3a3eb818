//! Content-stream interpretation for a single page.
//!
//! Walks the decoded operator list tracking text position, font, and
//! color state, and produces the raw per-page measurements that the
//! aggregation pass in [`crate::extract`] works from.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Channel spread below which an RGB color counts as gray.
pub const COLOR_GRAY_TOLERANCE: f64 = 0.05;

/// Rough advance width of one glyph relative to the font size, used to
/// estimate run extents when no precise metrics are available.
const GLYPH_ADVANCE_RATIO: f64 = 0.5;

/// Upper bound on outline/operator walks, guards against cyclic files.
const WALK_LIMIT: usize = 100_000;

/// One text-showing operation with its resolved position and font.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font: String,
    pub size_pt: f64,
}

impl TextRun {
    /// Estimated horizontal extent of the run.
    pub fn approx_width(&self) -> f64 {
        self.text.chars().count() as f64 * self.size_pt * GLYPH_ADVANCE_RATIO
    }

    /// Estimated horizontal center of the run.
    pub fn center_x(&self) -> f64 {
        self.x + self.approx_width() / 2.0
    }
}

/// Axis-aligned accumulator for placed content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn from_point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

fn extend_opt(target: &mut Option<BoundingBox>, x: f64, y: f64) {
    match target {
        Some(bbox) => bbox.extend(x, y),
        None => *target = Some(BoundingBox::from_point(x, y)),
    }
}

/// Raw measurements from one page's content stream.
#[derive(Debug, Default)]
pub struct PageScan {
    pub text_runs: Vec<TextRun>,
    /// Bounding box of path construction points (graphics only; text
    /// extents are derived from `text_runs`).
    pub path_box: Option<BoundingBox>,
    pub image_count: u32,
    pub image_bytes: u64,
    pub colored_elements: u32,
    pub has_color_text: bool,
}

/// Interpret a page's content stream.
///
/// Fails with a human-readable reason when the stream cannot be decoded;
/// the caller degrades that to a warning and skips the page.
pub fn scan_page(doc: &Document, page_id: ObjectId) -> Result<PageScan, String> {
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| format!("unreadable content stream: {e}"))?;
    let content =
        Content::decode(&data).map_err(|e| format!("undecodable content stream: {e}"))?;

    let fonts = page_fonts(doc, page_id);
    let images = page_images(doc, page_id);

    let mut scan = PageScan::default();

    // Text state
    let mut line_x = 0.0_f64;
    let mut line_y = 0.0_f64;
    let mut leading = 0.0_f64;
    let mut font = String::from("Unknown");
    let mut size_pt = 0.0_f64;

    // Color state
    let mut fill_colored = false;
    let mut stroke_colored = false;

    for op in content.operations.iter().take(WALK_LIMIT) {
        match op.operator.as_str() {
            "BT" => {
                line_x = 0.0;
                line_y = 0.0;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    font = fonts
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(name).into_owned());
                }
                size_pt = num(op, 1).unwrap_or(size_pt);
            }
            "TL" => leading = num(op, 0).unwrap_or(leading),
            "Td" => {
                line_x += num(op, 0).unwrap_or(0.0);
                line_y += num(op, 1).unwrap_or(0.0);
            }
            "TD" => {
                let ty = num(op, 1).unwrap_or(0.0);
                leading = -ty;
                line_x += num(op, 0).unwrap_or(0.0);
                line_y += ty;
            }
            "Tm" => {
                line_x = num(op, 4).unwrap_or(line_x);
                line_y = num(op, 5).unwrap_or(line_y);
            }
            "T*" => line_y -= leading,
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    line_y -= leading;
                }
                let operand = if op.operator == "\"" {
                    op.operands.get(2)
                } else {
                    op.operands.first()
                };
                if let Some(text) = operand.and_then(decode_text_operand) {
                    record_run(
                        &mut scan,
                        text,
                        line_x,
                        line_y,
                        &font,
                        size_pt,
                        fill_colored,
                    );
                }
            }
            "TJ" => {
                if let Some(text) = op.operands.first().and_then(decode_text_operand) {
                    record_run(
                        &mut scan,
                        text,
                        line_x,
                        line_y,
                        &font,
                        size_pt,
                        fill_colored,
                    );
                }
            }
            // Fill color
            "rg" => fill_colored = rgb_is_color(num(op, 0), num(op, 1), num(op, 2)),
            "g" => fill_colored = false,
            "k" => fill_colored = cmyk_is_color(num(op, 0), num(op, 1), num(op, 2)),
            // Stroke color
            "RG" => stroke_colored = rgb_is_color(num(op, 0), num(op, 1), num(op, 2)),
            "G" => stroke_colored = false,
            "K" => stroke_colored = cmyk_is_color(num(op, 0), num(op, 1), num(op, 2)),
            // Generic color operators: judge by operand count
            "sc" | "scn" => fill_colored = generic_is_color(op),
            "SC" | "SCN" => stroke_colored = generic_is_color(op),
            // Path construction
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) =
                    (num(op, 0), num(op, 1), num(op, 2), num(op, 3))
                {
                    extend_opt(&mut scan.path_box, x, y);
                    extend_opt(&mut scan.path_box, x + w, y + h);
                }
            }
            "m" | "l" => {
                if let (Some(x), Some(y)) = (num(op, 0), num(op, 1)) {
                    extend_opt(&mut scan.path_box, x, y);
                }
            }
            "c" => extend_pairs(&mut scan.path_box, op, 3),
            "v" | "y" => extend_pairs(&mut scan.path_box, op, 2),
            // Path painting
            "f" | "F" | "f*" => {
                if fill_colored {
                    scan.colored_elements += 1;
                }
            }
            "S" | "s" => {
                if stroke_colored {
                    scan.colored_elements += 1;
                }
            }
            "B" | "B*" | "b" | "b*" => {
                if fill_colored || stroke_colored {
                    scan.colored_elements += 1;
                }
            }
            // XObject placement
            "Do" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    if let Some(size) = images.get(name) {
                        scan.image_count += 1;
                        scan.image_bytes += size;
                    }
                }
            }
            // Inline image
            "BI" => scan.image_count += 1,
            _ => {}
        }
    }

    Ok(scan)
}

#[allow(clippy::too_many_arguments)]
fn record_run(
    scan: &mut PageScan,
    text: String,
    x: f64,
    y: f64,
    font: &str,
    size_pt: f64,
    fill_colored: bool,
) {
    if fill_colored {
        scan.has_color_text = true;
        scan.colored_elements += 1;
    }
    scan.text_runs.push(TextRun {
        text,
        x,
        y,
        font: font.to_string(),
        size_pt,
    });
}

fn num(op: &lopdf::content::Operation, index: usize) -> Option<f64> {
    op.operands
        .get(index)
        .and_then(|o| o.as_float().ok())
        .map(|v| v as f64)
}

fn rgb_is_color(r: Option<f64>, g: Option<f64>, b: Option<f64>) -> bool {
    match (r, g, b) {
        (Some(r), Some(g), Some(b)) => {
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            max - min > COLOR_GRAY_TOLERANCE
        }
        _ => false,
    }
}

fn cmyk_is_color(c: Option<f64>, m: Option<f64>, y: Option<f64>) -> bool {
    match (c, m, y) {
        (Some(c), Some(m), Some(y)) => c.max(m).max(y) > COLOR_GRAY_TOLERANCE,
        _ => false,
    }
}

fn generic_is_color(op: &lopdf::content::Operation) -> bool {
    let numeric: Vec<f64> = op
        .operands
        .iter()
        .filter_map(|o| o.as_float().ok())
        .map(|v| v as f64)
        .collect();
    match numeric.len() {
        3 => rgb_is_color(Some(numeric[0]), Some(numeric[1]), Some(numeric[2])),
        4 => cmyk_is_color(Some(numeric[0]), Some(numeric[1]), Some(numeric[2])),
        _ => false,
    }
}

fn extend_pairs(target: &mut Option<BoundingBox>, op: &lopdf::content::Operation, pairs: usize) {
    for i in 0..pairs {
        if let (Some(x), Some(y)) = (num(op, i * 2), num(op, i * 2 + 1)) {
            extend_opt(target, x, y);
        }
    }
}

/// Map of font resource names to resolved base-font names for a page.
fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, String> {
    let mut map = BTreeMap::new();
    for resources in resource_dicts(doc, page_id) {
        let Some(fonts) = resources.get(b"Font").ok().and_then(|o| deref_dict(doc, o)) else {
            continue;
        };
        for (name, value) in fonts.iter() {
            let Some(font_dict) = deref_dict(doc, value) else {
                continue;
            };
            let base = font_dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)))
                .unwrap_or_else(|| String::from_utf8_lossy(name).into_owned());
            map.insert(name.clone(), base);
        }
    }
    map
}

/// Map of image XObject resource names to their stream sizes.
fn page_images(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, u64> {
    let mut map = BTreeMap::new();
    for resources in resource_dicts(doc, page_id) {
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| deref_dict(doc, o))
        else {
            continue;
        };
        for (name, value) in xobjects.iter() {
            let resolved = deref(doc, value);
            if let Object::Stream(stream) = resolved {
                let is_image = matches!(
                    stream.dict.get(b"Subtype"),
                    Ok(Object::Name(sub)) if sub == b"Image"
                );
                if is_image {
                    map.insert(name.clone(), stream.content.len() as u64);
                }
            }
        }
    }
    map
}

fn resource_dicts(doc: &Document, page_id: ObjectId) -> Vec<&Dictionary> {
    let (direct, inherited) = doc.get_page_resources(page_id);
    let mut dicts = Vec::new();
    if let Some(dict) = direct {
        dicts.push(dict);
    }
    for id in inherited {
        if let Ok(dict) = doc.get_dictionary(id) {
            dicts.push(dict);
        }
    }
    dicts
}

pub(crate) fn deref<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object.as_reference() {
        Ok(id) => doc.get_object(id).unwrap_or(object),
        Err(_) => object,
    }
}

pub(crate) fn deref_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    deref(doc, object).as_dict().ok()
}

/// Embedded subset names look like `ABCDEF+Garamond`; drop the tag.
fn strip_subset_prefix(name: &str) -> String {
    let bytes = name.as_bytes();
    if bytes.len() > 7 && bytes[6] == b'+' && bytes[..6].iter().all(|b| b.is_ascii_uppercase()) {
        name[7..].to_string()
    } else {
        name.to_string()
    }
}

/// Decode the operand of a text-showing operator.
///
/// `TJ` arrays interleave strings with kerning adjustments; a large
/// negative adjustment usually stands for an inter-word gap.
fn decode_text_operand(operand: &Object) -> Option<String> {
    match operand {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                    Object::Integer(n) if *n < -100 => text.push(' '),
                    Object::Real(n) if *n < -100.0 => text.push(' '),
                    _ => {}
                }
            }
            Some(text)
        }
        _ => None,
    }
}

/// Decode a PDF string: UTF-8, then UTF-16BE with BOM, then Latin-1.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    bytes.iter().map(|&b| b as char).collect()
}
