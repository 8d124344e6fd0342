pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document as LopdfDocument;
use vellum::kernel::PdfDocument;
use vellum::{Document, DocumentConfig, Element, PageSize, Margins, VellumError};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const PAGE_WIDTH: f32 = 400.0;
pub const PAGE_HEIGHT: f32 = 600.0;

/// A rendered document, parsed back both as plain lopdf objects and through
/// the kernel for text extraction.
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
    pub pdf: PdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        let pdf = PdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc, pdf })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Save PDF to a file for manual debugging
    #[allow(dead_code)]
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// 400x600pt pages with 36pt margins, leaving a 328x528pt content area.
pub fn test_config() -> DocumentConfig {
    DocumentConfig {
        page_size: PageSize::Custom { width: PAGE_WIDTH, height: PAGE_HEIGHT },
        margins: Margins::all(36.0),
        ..Default::default()
    }
}

pub fn render(elements: Vec<Element>) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    render_with(test_config(), elements)
}

pub fn render_with(
    config: DocumentConfig,
    elements: Vec<Element>,
) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    let bytes = render_bytes(config, elements)?;
    GeneratedPdf::from_bytes(bytes)
}

pub fn render_bytes(config: DocumentConfig, elements: Vec<Element>) -> Result<Vec<u8>, VellumError> {
    let mut document = Document::new(config);
    for element in elements {
        document.add(element);
    }
    document.render_to_bytes()
}
