use crate::config::DocumentConfig;
use crate::error::VellumError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use vellum_kernel::PdfDocument;
use vellum_layout::algorithms::{draw_pages, paginate, LaidOutPage, PageGeometry};
use vellum_layout::{Element, ElementRef, RendererId, RendererTree};

/// A document under construction: elements are added in reading order, then
/// laid out over pages and written as PDF in one go.
///
/// ```no_run
/// use vellum::{Document, DocumentConfig, Element, ElementPropertyContainer};
///
/// let mut document = Document::new(DocumentConfig::default());
/// document.add(Element::paragraph_with("Hello").set_font_size(18.0));
/// document.save("hello.pdf")?;
/// # Ok::<(), vellum::VellumError>(())
/// ```
pub struct Document {
    config: DocumentConfig,
    tree: RendererTree,
    root: RendererId,
}

impl Document {
    pub fn new(config: DocumentConfig) -> Self {
        let mut tree = RendererTree::new(config.layout);
        let root = tree.create_root();
        Self { config, tree, root }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Appends an element and returns the shared handle its renderers read
    /// their properties from.
    pub fn add(&mut self, element: Element) -> ElementRef {
        let element = element.into_ref();
        self.add_ref(element.clone());
        element
    }

    pub fn add_ref(&mut self, element: ElementRef) -> &mut Self {
        self.tree.create_renderer_subtree(&element, Some(self.root));
        self
    }

    pub fn tree(&self) -> &RendererTree {
        &self.tree
    }

    fn geometry(&self) -> PageGeometry {
        PageGeometry {
            page: self.config.page_rect(),
            content: self.config.content_rect(),
        }
    }

    /// Distributes the added elements over pages without drawing them.
    pub fn layout(&mut self) -> Result<Vec<LaidOutPage>, VellumError> {
        let geometry = self.geometry();
        let pages = paginate(&mut self.tree, self.root, &geometry)?;
        debug!("Laid out {} renderers over {} pages", self.tree.len(), pages.len());
        Ok(pages)
    }

    /// Lays out and draws every page into a fresh PDF document.
    pub fn render(mut self) -> Result<PdfDocument, VellumError> {
        let pages = self.layout()?;
        let mut pdf = PdfDocument::new(&self.config.pdf_version);
        if self.config.tagged {
            pdf.set_tagged()?;
        }
        pdf.set_info("Producer", "vellum");
        if let Some(title) = &self.config.title {
            pdf.set_info("Title", title);
        }

        draw_pages(&mut self.tree, &pages, &mut pdf, self.config.page_rect())?;
        pdf.finish()?;
        info!("Rendered {} pages", pdf.page_count());
        Ok(pdf)
    }

    pub fn render_to_writer<W: Write>(self, writer: &mut W) -> Result<(), VellumError> {
        let mut pdf = self.render()?;
        pdf.save_to(writer)?;
        Ok(())
    }

    pub fn render_to_bytes(self) -> Result<Vec<u8>, VellumError> {
        let mut pdf = self.render()?;
        Ok(pdf.save_to_bytes()?)
    }

    pub fn save(self, path: impl AsRef<Path>) -> Result<(), VellumError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.render_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_layout::ElementPropertyContainer;
    use vellum_style::PageSize;

    fn small_page() -> DocumentConfig {
        DocumentConfig {
            page_size: PageSize::Custom { width: 200.0, height: 200.0 },
            margins: vellum_style::Margins::all(10.0),
            ..Default::default()
        }
    }

    #[test]
    fn elements_are_laid_out_in_the_content_area() {
        let mut document = Document::new(small_page());
        document.add(Element::div().set_height(50.0));
        document.add(Element::div().set_height(30.0));
        let pages = document.layout().unwrap();

        assert_eq!(pages.len(), 1);
        let [first, second] = pages[0].renderers[..] else { panic!("expected two renderers") };
        assert_eq!(document.tree().occupied_area_bbox(first).unwrap().top(), 190.0);
        assert_eq!(document.tree().occupied_area_bbox(second).unwrap().top(), 140.0);
    }

    #[test]
    fn tall_content_continues_on_the_next_page() {
        let mut document = Document::new(small_page());
        document.add(Element::div().set_height(150.0));
        document.add(Element::div().set_height(150.0));
        let pdf = document.render().unwrap();
        assert_eq!(pdf.page_count(), 2);
    }

    #[test]
    fn title_goes_into_the_info_dictionary() {
        let config = DocumentConfig { title: Some("Report".to_string()), ..small_page() };
        let mut document = Document::new(config);
        document.add(Element::paragraph_with("x"));
        let pdf = document.render().unwrap();

        let info = pdf.lopdf().trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = pdf.dictionary(info).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Report");
    }
}
