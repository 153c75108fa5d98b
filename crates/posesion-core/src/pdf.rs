//! Low-level PDF assembly
//!
//! Wraps the loaded template document and turns projected text
//! positions into content-stream operators. Text is drawn with the
//! built-in Helvetica font under WinAnsi encoding, which covers the
//! accented characters Chilean records carry. Each touched page gets
//! one appended content stream; annex pages are created from scratch
//! and hung off the page tree root.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::RenderError;
use crate::geometry::PagePoint;

/// Resource name the appended streams select the overlay font by.
const FONT_NAME: &str = "Helv";

/// Accumulates text operators for a single page.
#[derive(Debug, Default)]
pub struct PageText {
    ops: Vec<u8>,
}

impl PageText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one text run at a projected page point. Empty text draws
    /// nothing, matching the silent-degrade contract for blank fields.
    pub fn draw(&mut self, at: PagePoint, size: f64, text: &str) {
        if text.is_empty() {
            return;
        }
        let matrix = match at.rotate {
            90 => format!("0 1 -1 0 {} {}", fmt(at.x), fmt(at.y)),
            _ => format!("1 0 0 1 {} {}", fmt(at.x), fmt(at.y)),
        };
        self.ops
            .extend_from_slice(format!("BT /{FONT_NAME} {} Tf {} Tm (", fmt(size), matrix).as_bytes());
        self.ops.extend_from_slice(&encode_winansi(text));
        self.ops.extend_from_slice(b") Tj ET\n");
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The finished stream bytes, isolated inside a q/Q pair so the
    /// overlay never inherits leftover graphics state.
    fn into_stream_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.ops.len() + 4);
        bytes.extend_from_slice(b"q\n");
        bytes.extend_from_slice(&self.ops);
        bytes.extend_from_slice(b"Q");
        bytes
    }
}

/// The template document being filled, with its base pages in order.
pub struct FormDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    font_id: Option<ObjectId>,
}

impl FormDocument {
    /// Load the template bytes. Failure here is fatal for the whole
    /// render.
    pub fn load(template: &[u8]) -> Result<Self, RenderError> {
        let doc = Document::load_mem(template)
            .map_err(|e| RenderError::Template(format!("{e}")))?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages, font_id: None })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// MediaBox width/height of a base page, when present and well
    /// formed.
    pub fn media_box(&self, index: usize) -> Option<(f64, f64)> {
        let page_id = *self.pages.get(index)?;
        let page = self.doc.get_dictionary(page_id).ok()?;
        let media_box = page.get(b"MediaBox").ok()?.as_array().ok()?;
        if media_box.len() != 4 {
            return None;
        }
        let nums: Vec<f64> = media_box.iter().filter_map(|o| as_number(o)).collect();
        if nums.len() != 4 {
            return None;
        }
        Some((nums[2] - nums[0], nums[3] - nums[1]))
    }

    /// Append the accumulated text of one base page as a new content
    /// stream, registering the overlay font in the page's resources.
    pub fn apply_text(&mut self, index: usize, text: PageText) -> Result<(), RenderError> {
        if text.is_empty() {
            return Ok(());
        }
        let page_id = *self
            .pages
            .get(index)
            .ok_or_else(|| assembly(format!("page {index} out of range")))?;
        self.register_font(page_id)?;

        let content_id = self.doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            text.into_stream_bytes(),
        )));
        let page = self.page_dict_mut(page_id)?;
        let contents = match page.get(b"Contents") {
            Ok(Object::Reference(existing)) => Object::Array(vec![
                Object::Reference(*existing),
                Object::Reference(content_id),
            ]),
            Ok(Object::Array(existing)) => {
                let mut streams = existing.clone();
                streams.push(Object::Reference(content_id));
                Object::Array(streams)
            }
            _ => Object::Reference(content_id),
        };
        page.set("Contents", contents);
        Ok(())
    }

    /// Create a fresh page at the end of the document carrying only
    /// the given text.
    pub fn append_page(
        &mut self,
        media_box: [f64; 2],
        rotate: i64,
        text: PageText,
    ) -> Result<(), RenderError> {
        let font_id = self.ensure_font();
        let pages_root = self.pages_root_id()?;

        let content_id = self.doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            text.into_stream_bytes(),
        )));

        let mut fonts = Dictionary::new();
        fonts.set(FONT_NAME, Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_root));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(media_box[0] as f32),
                Object::Real(media_box[1] as f32),
            ]),
        );
        if rotate != 0 {
            page.set("Rotate", Object::Integer(rotate));
        }
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));
        let page_id = self.doc.add_object(Object::Dictionary(page));

        let pages_dict = self
            .doc
            .get_object_mut(pages_root)
            .map_err(|e| assembly(format!("page tree root missing: {e}")))?
            .as_dict_mut()
            .map_err(|_| assembly("page tree root is not a dictionary".into()))?;
        let mut kids = match pages_dict.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => Vec::new(),
        };
        kids.push(Object::Reference(page_id));
        let count = match pages_dict.get(b"Count") {
            Ok(Object::Integer(count)) => count + 1,
            _ => kids.len() as i64,
        };
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(count));

        self.pages.push(page_id);
        Ok(())
    }

    /// Serialize the filled document.
    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| assembly(format!("failed to save: {e}")))?;
        Ok(buffer)
    }

    fn ensure_font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let id = self.doc.add_object(Object::Dictionary(font));
        self.font_id = Some(id);
        id
    }

    /// Make the overlay font reachable from a base page, whatever
    /// shape its Resources take (absent, inline, or indirect, with
    /// Font itself possibly indirect).
    fn register_font(&mut self, page_id: ObjectId) -> Result<(), RenderError> {
        let font_id = self.ensure_font();

        enum FontSlot {
            IndirectFont(ObjectId),
            IndirectResources(ObjectId),
            OnPage,
        }

        let slot = {
            let page = self
                .doc
                .get_dictionary(page_id)
                .map_err(|e| assembly(format!("page dictionary missing: {e}")))?;
            match page.get(b"Resources") {
                Ok(Object::Reference(resources_id)) => {
                    let resources = self
                        .doc
                        .get_dictionary(*resources_id)
                        .map_err(|e| assembly(format!("resources missing: {e}")))?;
                    match resources.get(b"Font") {
                        Ok(Object::Reference(fonts_id)) => FontSlot::IndirectFont(*fonts_id),
                        _ => FontSlot::IndirectResources(*resources_id),
                    }
                }
                Ok(Object::Dictionary(resources)) => match resources.get(b"Font") {
                    Ok(Object::Reference(fonts_id)) => FontSlot::IndirectFont(*fonts_id),
                    _ => FontSlot::OnPage,
                },
                _ => FontSlot::OnPage,
            }
        };

        match slot {
            FontSlot::IndirectFont(fonts_id) => {
                let fonts = self
                    .doc
                    .get_object_mut(fonts_id)
                    .map_err(|e| assembly(format!("font dictionary missing: {e}")))?
                    .as_dict_mut()
                    .map_err(|_| assembly("Font is not a dictionary".into()))?;
                fonts.set(FONT_NAME, Object::Reference(font_id));
            }
            FontSlot::IndirectResources(resources_id) => {
                let resources = self
                    .doc
                    .get_object_mut(resources_id)
                    .map_err(|e| assembly(format!("resources missing: {e}")))?
                    .as_dict_mut()
                    .map_err(|_| assembly("Resources is not a dictionary".into()))?;
                let mut fonts = match resources.get(b"Font") {
                    Ok(Object::Dictionary(fonts)) => fonts.clone(),
                    _ => Dictionary::new(),
                };
                fonts.set(FONT_NAME, Object::Reference(font_id));
                resources.set("Font", Object::Dictionary(fonts));
            }
            FontSlot::OnPage => {
                let page = self.page_dict_mut(page_id)?;
                let mut resources = match page.get(b"Resources") {
                    Ok(Object::Dictionary(resources)) => resources.clone(),
                    _ => Dictionary::new(),
                };
                let mut fonts = match resources.get(b"Font") {
                    Ok(Object::Dictionary(fonts)) => fonts.clone(),
                    _ => Dictionary::new(),
                };
                fonts.set(FONT_NAME, Object::Reference(font_id));
                resources.set("Font", Object::Dictionary(fonts));
                page.set("Resources", Object::Dictionary(resources));
            }
        }
        Ok(())
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, RenderError> {
        self.doc
            .get_object_mut(page_id)
            .map_err(|e| assembly(format!("page object missing: {e}")))?
            .as_dict_mut()
            .map_err(|_| assembly("page is not a dictionary".into()))
    }

    fn pages_root_id(&self) -> Result<ObjectId, RenderError> {
        let root = self
            .doc
            .trailer
            .get(b"Root")
            .map_err(|_| assembly("no Root in trailer".into()))?
            .as_reference()
            .map_err(|_| assembly("Root is not a reference".into()))?;
        let catalog = self
            .doc
            .get_dictionary(root)
            .map_err(|e| assembly(format!("catalog missing: {e}")))?;
        catalog
            .get(b"Pages")
            .map_err(|_| assembly("no Pages in catalog".into()))?
            .as_reference()
            .map_err(|_| assembly("Pages is not a reference".into()))
    }
}

fn assembly(message: String) -> RenderError {
    RenderError::Assembly(message)
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

/// Format a coordinate or size for a content stream, trimming
/// trailing zeros.
fn fmt(value: f64) -> String {
    let text = format!("{value:.2}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Encode text as WinAnsi (CP1252) bytes for a PDF literal string,
/// escaping the string delimiters. Characters outside the encoding
/// become '?'.
fn encode_winansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let byte = match c as u32 {
            0x20..=0x7E => c as u8,
            0xA0..=0xFF => c as u8,
            0x20AC => 0x80,
            0x201A => 0x82,
            0x0192 => 0x83,
            0x201E => 0x84,
            0x2026 => 0x85,
            0x2020 => 0x86,
            0x2021 => 0x87,
            0x02C6 => 0x88,
            0x2030 => 0x89,
            0x0160 => 0x8A,
            0x2039 => 0x8B,
            0x0152 => 0x8C,
            0x017D => 0x8E,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x02DC => 0x98,
            0x2122 => 0x99,
            0x0161 => 0x9A,
            0x203A => 0x9B,
            0x0153 => 0x9C,
            0x017E => 0x9E,
            0x0178 => 0x9F,
            _ => b'?',
        };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            _ => out.push(byte),
        }
    }
    out
}

/// Minimal in-memory template with the given number of pages,
/// letter-portrait with a 90 degree rotation like the real form.
#[cfg(test)]
pub(crate) fn test_template(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut kids = Vec::new();
    for page_num in 0..num_pages {
        let content_id = doc.new_object_id();
        let content = format!("BT /F1 10 Tf 50 700 Td (Base-{}) Tj ET", page_num + 1);
        doc.objects.insert(
            content_id,
            Object::Stream(Stream::new(Dictionary::new(), content.into_bytes())),
        );

        let page_id = doc.new_object_id();
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        page.set("Rotate", Object::Integer(90));
        doc.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(num_pages as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
