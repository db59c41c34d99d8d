//! Page images from scanned PDFs using lopdf.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::io::Cursor;
use tracing::{debug, trace, warn};

use super::{Rasterizer, Result};
use crate::error::PdfError;

/// Rasterizer for scanned documents.
///
/// Mail attachments are mostly scans, where every page is one embedded
/// image. For each page the largest decodable image XObject is taken and
/// re-encoded as PNG. Vector-only pages produce no image.
#[derive(Debug, Clone)]
pub struct PageImageRasterizer {
    /// Maximum pages to render (0 = unlimited).
    max_pages: usize,
}

impl PageImageRasterizer {
    pub fn new() -> Self {
        Self { max_pages: 0 }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn load(&self, data: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok(doc)
    }

    fn page_image(&self, doc: &Document, page_id: ObjectId) -> Option<DynamicImage> {
        let resources = page_resources(doc, page_id)?;
        let xobjects = resources.get(b"XObject").ok()?;
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return None;
        };

        xobj_dict
            .iter()
            .filter_map(|(_name, obj_ref)| doc.dereference(obj_ref).ok())
            .filter_map(|(_, obj)| decode_image_object(doc, obj))
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
    }
}

impl Default for PageImageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PageImageRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>> {
        let doc = self.load(pdf)?;
        let pages = doc.get_pages();
        let limit = if self.max_pages == 0 {
            pages.len()
        } else {
            self.max_pages
        };

        let mut images = Vec::new();
        for (page_num, page_id) in pages.iter().take(limit) {
            let Some(image) = self.page_image(&doc, *page_id) else {
                warn!("No decodable image on page {}", page_num);
                continue;
            };

            let mut png = Vec::new();
            match image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png) {
                Ok(()) => images.push(png),
                Err(e) => warn!("Failed to encode page {} as PNG: {}", page_num, e),
            }
        }

        debug!("Rasterized {} of {} pages", images.len(), pages.len());
        Ok(images)
    }
}

fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    // Check if it's an image XObject
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG data - use raw stream content (already compressed)
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    image_from_raw(&data, width, height, color_space, bits)
}

fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let channels = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => return None,
    };
    let expected = pixels.checked_mul(channels)?;
    if data.len() < expected {
        trace!("Short image data: {} < {}", data.len(), expected);
        return None;
    }

    let mut rgba = Vec::with_capacity(pixels * 4);
    for px in data[..expected].chunks(channels) {
        if channels == 3 {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        } else {
            rgba.extend_from_slice(&[px[0], px[0], px[0], 255]);
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

/// Resources dictionary for a page, following `Parent` inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}
