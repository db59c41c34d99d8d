//! PDF rasterization.

mod rasterizer;

pub use rasterizer::PageImageRasterizer;

use crate::error::PdfError;

/// MIME type that triggers rasterization.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns a PDF into one image per page.
pub trait Rasterizer {
    /// Encoded page images (PNG), in page order. Pages that cannot be
    /// rendered are left out.
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>>;
}
