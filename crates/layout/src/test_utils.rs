use crate::element::{Element, ImageColorSpace, ImageData};
use crate::interface::{LayoutContext, LayoutResult};
use crate::renderer::{LayoutArea, RendererId, RendererTree};
use crate::LayoutError;
use std::rc::Rc;
use vellum_kernel::PdfCanvas;
use vellum_types::{Color, Rectangle};

pub const PAGE_WIDTH: f32 = 400.0;
pub const PAGE_HEIGHT: f32 = 600.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A tree with a root and `element` attached below it.
pub fn tree_with(element: Element) -> (RendererTree, RendererId, RendererId) {
    init_logging();
    let mut tree = RendererTree::default();
    let root = tree.create_root();
    let id = tree.create_renderer_subtree(&element.into_ref(), Some(root));
    (tree, root, id)
}

pub fn area(x: f32, y: f32, width: f32, height: f32) -> LayoutArea {
    LayoutArea::new(1, Rectangle::new(x, y, width, height))
}

pub fn page_area() -> LayoutArea {
    area(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT)
}

pub fn layout_in(tree: &mut RendererTree, id: RendererId, area: LayoutArea) -> Result<LayoutResult, LayoutError> {
    tree.layout(id, &LayoutContext::new(area))
}

pub fn bbox(tree: &RendererTree, id: RendererId) -> Rectangle {
    tree.occupied_area_bbox(id).unwrap()
}

/// A solid grey image, one point per pixel.
pub fn gray_image(width: u32, height: u32) -> Rc<ImageData> {
    Rc::new(ImageData::new(
        width,
        height,
        ImageColorSpace::Gray,
        vec![0x80; (width * height) as usize],
    ))
}

pub fn red_image(width: u32, height: u32) -> Rc<ImageData> {
    Rc::new(ImageData::filled(width, height, Color::rgb(255, 0, 0)))
}

pub fn operators(canvas: &PdfCanvas) -> Vec<String> {
    canvas.operations().iter().map(|op| op.operator.clone()).collect()
}

pub fn count_operator(canvas: &PdfCanvas, operator: &str) -> usize {
    canvas.operations().iter().filter(|op| op.operator == operator).count()
}

/// Enough words to fill several lines at the default font size.
pub fn long_text(words: usize) -> String {
    vec!["lorem"; words].join(" ")
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
